//! Electrical metering over a set of outlets.

use crate::device::Device;
use crate::error::TickError;
use crate::outlet::Outlet;
use crate::tick::Tickable;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const SECS_PER_HOUR: f64 = 3600.0;

/// Meter summing the consumption of the outlets it supervises.
pub trait ElectricalMeter: Tickable {
    /// Outlets behind this meter.
    fn outlets(&self) -> Vec<Arc<Outlet>>;
    
    /// Instantaneous draw of all outlets, in watts.
    fn global_consumption(&self) -> f64;
    
    /// Energy consumed since the meter started, in watt-hours.
    fn total_energy_wh(&self) -> f64;
    
    /// Mean draw over the metered virtual time, in watts.
    fn average_power(&self) -> f64;
    
    /// Switches off `outlet`. Returns false if it is not metered here.
    fn cut_power_to(&self, outlet: &Outlet) -> bool;
}

/// Meter integrating outlet consumption over virtual time.
///
/// Each tick adds `global_consumption * delta` to the energy total, so a
/// load switched during a tick is billed from the next tick on.
#[derive(Debug)]
pub struct HomeElectricalMeter {
    outlets: Vec<Arc<Outlet>>,
    readings: Mutex<Readings>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Readings {
    energy_wh: f64,
    metered: Duration,
}

impl HomeElectricalMeter {
    pub fn new(outlets: Vec<Arc<Outlet>>) -> Self {
        Self {
            outlets,
            readings: Mutex::new(Readings::default()),
        }
    }
    
    fn lock(&self) -> MutexGuard<'_, Readings> {
        self.readings.lock().unwrap_or_else(PoisonError::into_inner)
    }
    
    /// Virtual time covered by the readings.
    pub fn metered_time(&self) -> Duration {
        self.lock().metered
    }
}

impl Tickable for HomeElectricalMeter {
    fn update_tick(&self, delta: Duration) -> Result<(), TickError> {
        let consumption = self.global_consumption();
        let mut readings = self.lock();
        readings.energy_wh += consumption * delta.as_secs_f64() / SECS_PER_HOUR;
        readings.metered = readings.metered.saturating_add(delta);
        Ok(())
    }
}

impl ElectricalMeter for HomeElectricalMeter {
    fn outlets(&self) -> Vec<Arc<Outlet>> {
        self.outlets.clone()
    }
    
    fn global_consumption(&self) -> f64 {
        self.outlets.iter().map(|outlet| outlet.power()).sum()
    }
    
    fn total_energy_wh(&self) -> f64 {
        self.lock().energy_wh
    }
    
    fn average_power(&self) -> f64 {
        let readings = *self.lock();
        let secs = readings.metered.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        readings.energy_wh * SECS_PER_HOUR / secs
    }
    
    fn cut_power_to(&self, outlet: &Outlet) -> bool {
        let metered = self
            .outlets
            .iter()
            .any(|candidate| std::ptr::eq(Arc::as_ptr(candidate), outlet));
        if metered {
            outlet.switch_off();
            tracing::debug!(outlet = outlet.name(), "power cut");
        }
        metered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    
    fn meter() -> (HomeElectricalMeter, Arc<Outlet>, Arc<Outlet>) {
        let heater = Arc::new(Outlet::new("heater", 1000.0, 3000.0).unwrap());
        let lamp = Arc::new(Outlet::new("lamp", 60.0, 100.0).unwrap());
        let meter = HomeElectricalMeter::new(vec![heater.clone(), lamp.clone()]);
        (meter, heater, lamp)
    }
    
    #[test]
    fn test_global_consumption_sums_outlets() {
        let (meter, _, lamp) = meter();
        assert_relative_eq!(meter.global_consumption(), 1060.0);
        
        lamp.switch_off();
        assert_relative_eq!(meter.global_consumption(), 1000.0);
    }
    
    #[test]
    fn test_energy_integrates_over_ticks() {
        let (meter, _, lamp) = meter();
        lamp.switch_off();
        
        // 1000 W for 30 min = 500 Wh
        for _ in 0..30 {
            meter.update_tick(Duration::from_secs(60)).unwrap();
        }
        
        assert_relative_eq!(meter.total_energy_wh(), 500.0, epsilon = 1e-9);
        assert_relative_eq!(meter.average_power(), 1000.0, epsilon = 1e-9);
        assert_eq!(meter.metered_time(), Duration::from_secs(1800));
    }
    
    #[test]
    fn test_average_power_tracks_switching() {
        let (meter, heater, _) = meter();
        
        meter.update_tick(Duration::from_secs(3600)).unwrap();
        heater.switch_off();
        meter.update_tick(Duration::from_secs(3600)).unwrap();
        
        // (1060 + 60) Wh over 2 h
        assert_relative_eq!(meter.total_energy_wh(), 1120.0, epsilon = 1e-9);
        assert_relative_eq!(meter.average_power(), 560.0, epsilon = 1e-9);
    }
    
    #[test]
    fn test_average_power_is_zero_before_first_tick() {
        let (meter, _, _) = meter();
        assert_eq!(meter.average_power(), 0.0);
    }
    
    #[test]
    fn test_cut_power_only_affects_metered_outlets() {
        let (meter, heater, _) = meter();
        let stranger = Outlet::new("stranger", 10.0, 100.0).unwrap();
        
        assert!(meter.cut_power_to(&heater));
        assert!(!heater.is_on());
        
        assert!(!meter.cut_power_to(&stranger));
        assert!(stranger.is_on());
        assert_eq!(stranger.state().as_outlet().map(|s| s.power()), Some(10.0));
    }
}
