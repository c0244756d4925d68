// Managers Module
//
// Focused owners of shared state, each behind its own locks:
// - CalibrationManager: Ambient noise baseline shared by every detection call
// - GameRegistry: Live games keyed by id, event dispatch and calibration fan-out

pub mod calibration_manager;
pub mod game_registry;

pub use calibration_manager::CalibrationManager;
pub use game_registry::GameRegistry;
