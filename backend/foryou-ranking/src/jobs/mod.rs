// ============================================
// Background Jobs Module
// ============================================
//
// Contains background job runners for:
// 1. Periodic profile refresh
//
// Jobs are driven by the calling application; the ranking core itself never
// schedules anything.

pub mod profile_refresh;

pub use profile_refresh::{ProfileRefreshJob, RefreshStats};
