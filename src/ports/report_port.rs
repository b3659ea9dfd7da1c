//! Report generation port trait.

use crate::domain::cycle::Cycle;
use crate::domain::error::CrisisWatchError;

/// Port for writing one evaluation cycle out for display.
pub trait ReportPort {
    fn write(&self, cycle: &Cycle, output_path: &str) -> Result<(), CrisisWatchError>;
}
