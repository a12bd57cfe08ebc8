//! In-memory zone repository.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use hearth_app::ports::ZoneRepository;
use hearth_domain::error::{HearthError, NotFoundError};
use hearth_domain::id::ZoneId;
use hearth_domain::safety::SafetySensor;
use hearth_domain::settings::GlobalSettings;
use hearth_domain::status::ZoneStatus;
use hearth_domain::zone::Zone;

/// All control configuration held behind one mutex per collection.
#[derive(Default)]
pub struct InMemoryZoneRepository {
    zones: Mutex<Vec<Zone>>,
    settings: Mutex<GlobalSettings>,
    safety_sensors: Mutex<Vec<SafetySensor>>,
    statuses: Mutex<HashMap<ZoneId, ZoneStatus>>,
}

impl InMemoryZoneRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a zone.
    pub fn upsert_zone(&self, zone: Zone) {
        let mut zones = lock(&self.zones);
        match zones.iter_mut().find(|z| z.id == zone.id) {
            Some(existing) => *existing = zone,
            None => zones.push(zone),
        }
    }

    pub fn set_settings(&self, settings: GlobalSettings) {
        *lock(&self.settings) = settings;
    }

    pub fn add_safety_sensor(&self, sensor: SafetySensor) {
        lock(&self.safety_sensors).push(sensor);
    }

    /// Last status the engine published for a zone.
    #[must_use]
    pub fn status(&self, zone: ZoneId) -> Option<ZoneStatus> {
        lock(&self.statuses).get(&zone).cloned()
    }
}

// Poisoning cannot happen here (no panic while holding the lock), so a
// poisoned mutex is recovered rather than propagated.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl ZoneRepository for InMemoryZoneRepository {
    fn zones(&self) -> impl Future<Output = Result<Vec<Zone>, HearthError>> + Send {
        let zones = lock(&self.zones).clone();
        async { Ok(zones) }
    }

    fn zone(&self, id: ZoneId) -> impl Future<Output = Result<Option<Zone>, HearthError>> + Send {
        let zone = lock(&self.zones).iter().find(|z| z.id == id).cloned();
        async { Ok(zone) }
    }

    fn settings(&self) -> impl Future<Output = Result<GlobalSettings, HearthError>> + Send {
        let settings = lock(&self.settings).clone();
        async { Ok(settings) }
    }

    fn safety_sensors(
        &self,
    ) -> impl Future<Output = Result<Vec<SafetySensor>, HearthError>> + Send {
        let sensors = lock(&self.safety_sensors).clone();
        async { Ok(sensors) }
    }

    fn save_status(
        &self,
        status: ZoneStatus,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        lock(&self.statuses).insert(status.zone, status);
        async { Ok(()) }
    }

    fn set_zone_enabled(
        &self,
        id: ZoneId,
        enabled: bool,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        let result = {
            let mut zones = lock(&self.zones);
            match zones.iter_mut().find(|z| z.id == id) {
                Some(zone) => {
                    zone.enabled = enabled;
                    Ok(())
                }
                None => Err(HearthError::NotFound(NotFoundError {
                    entity: "Zone",
                    id: id.to_string(),
                })),
            }
        };
        async { result }
    }
}
