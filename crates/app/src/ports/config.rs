//! Configuration port — read-only access to control configuration plus
//! the write-back path for computed zone status.
//!
//! Zone/device CRUD happens in the persistence collaborator, never here.
//! The core only reads configuration snapshots and republishes computed
//! fields.

use std::future::Future;

use hearth_domain::error::HearthError;
use hearth_domain::id::ZoneId;
use hearth_domain::safety::SafetySensor;
use hearth_domain::settings::GlobalSettings;
use hearth_domain::status::ZoneStatus;
use hearth_domain::zone::Zone;

/// Read-only configuration access plus status write-back.
pub trait ZoneRepository {
    /// All configured zones, hidden and disabled ones included.
    fn zones(&self) -> impl Future<Output = Result<Vec<Zone>, HearthError>> + Send;

    /// One zone by id.
    fn zone(&self, id: ZoneId)
    -> impl Future<Output = Result<Option<Zone>, HearthError>> + Send;

    /// Current global settings.
    fn settings(&self) -> impl Future<Output = Result<GlobalSettings, HearthError>> + Send;

    /// Configured safety sensors.
    fn safety_sensors(&self) -> impl Future<Output = Result<Vec<SafetySensor>, HearthError>> + Send;

    /// Republish computed per-zone fields for the transport layer.
    fn save_status(
        &self,
        status: ZoneStatus,
    ) -> impl Future<Output = Result<(), HearthError>> + Send;

    /// Flip a zone's enabled flag. The coordinator guards this with the
    /// safety interlock before delegating here.
    fn set_zone_enabled(
        &self,
        id: ZoneId,
        enabled: bool,
    ) -> impl Future<Output = Result<(), HearthError>> + Send;
}

impl<T: ZoneRepository + Send + Sync> ZoneRepository for std::sync::Arc<T> {
    fn zones(&self) -> impl Future<Output = Result<Vec<Zone>, HearthError>> + Send {
        (**self).zones()
    }

    fn zone(
        &self,
        id: ZoneId,
    ) -> impl Future<Output = Result<Option<Zone>, HearthError>> + Send {
        (**self).zone(id)
    }

    fn settings(&self) -> impl Future<Output = Result<GlobalSettings, HearthError>> + Send {
        (**self).settings()
    }

    fn safety_sensors(
        &self,
    ) -> impl Future<Output = Result<Vec<SafetySensor>, HearthError>> + Send {
        (**self).safety_sensors()
    }

    fn save_status(
        &self,
        status: ZoneStatus,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        (**self).save_status(status)
    }

    fn set_zone_enabled(
        &self,
        id: ZoneId,
        enabled: bool,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        (**self).set_zone_enabled(id, enabled)
    }
}
