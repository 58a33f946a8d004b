use super::CacheOptions;

use std::fmt;
use std::time::Duration;

const fn minutes(n: u64) -> Duration {
  Duration::from_secs(n * 60)
}

/// The resources of the booking admin console, each with the timing that
/// matches how often its data changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
  AdminTrips,
  /// Bookings change more often than trips.
  AdminBookings,
  AdminUsers,
  /// Dashboard statistics are never served from cache without refetching.
  AdminStats,
  AdminActivity,
  AdminRoutes,
  AdminBuses,
  AdminDrivers,
}

impl Preset {
  pub const ALL: [Preset; 8] = [
    Preset::AdminTrips,
    Preset::AdminBookings,
    Preset::AdminUsers,
    Preset::AdminStats,
    Preset::AdminActivity,
    Preset::AdminRoutes,
    Preset::AdminBuses,
    Preset::AdminDrivers,
  ];

  /// The cache key the resource is stored under.
  pub const fn key(self) -> &'static str {
    match self {
      Preset::AdminTrips => "admin-trips",
      Preset::AdminBookings => "admin-bookings",
      Preset::AdminUsers => "admin-users",
      Preset::AdminStats => "admin-stats",
      Preset::AdminActivity => "admin-activity",
      Preset::AdminRoutes => "admin-routes",
      Preset::AdminBuses => "admin-buses",
      Preset::AdminDrivers => "admin-drivers",
    }
  }

  pub const fn options(self) -> CacheOptions {
    match self {
      Preset::AdminTrips => CacheOptions::new(minutes(2), minutes(5)),
      Preset::AdminBookings => CacheOptions::new(minutes(1), minutes(3)),
      Preset::AdminUsers => CacheOptions::new(minutes(5), minutes(10)),
      Preset::AdminStats => CacheOptions::new(Duration::ZERO, minutes(1)),
      Preset::AdminActivity => CacheOptions::new(Duration::from_secs(30), minutes(2)),
      // Dropdown options rarely change.
      Preset::AdminRoutes | Preset::AdminBuses | Preset::AdminDrivers => {
        CacheOptions::new(minutes(10), minutes(30))
      }
    }
  }

  pub fn from_key(key: &str) -> Option<Preset> {
    Self::ALL.into_iter().find(|preset| preset.key() == key)
  }
}

impl fmt::Display for Preset {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}
