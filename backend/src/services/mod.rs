//! Monitoring services for the field health backend

pub mod cache;
pub mod connectivity;
pub mod dispatcher;
pub mod monitor;
pub mod notification;
pub mod persistence;
pub mod prescription;

pub use cache::{CachedAnalysis, Clock, ImagerySnapshot, OfflineCache, SystemClock};
pub use connectivity::{ConnectivityMonitor, ConnectivityObserver};
pub use dispatcher::{AlertDispatcher, DispatchReport};
pub use monitor::{FieldMonitor, MonitorDeps, MonitorFieldRequest, MonitorSettings, MonitoringResult};
pub use notification::{DispatchTarget, InAppNotificationStore, NotificationChannel};
pub use persistence::{PersistenceCollaborator, PgPersistence};
