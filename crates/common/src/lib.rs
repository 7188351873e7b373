//! Shared building blocks for the report desk crates.
//! - Logging initialisation (`utils::logging`)
//! - Startup environment checks (`env`)
//! - Small response types shared by service and server (`types`)

pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn action_result_shapes() {
        let ok = types::ActionResult::ok("Report submitted successfully!");
        assert!(ok.success);
        let failed = types::ActionResult::failed("Failed to submit report.");
        assert!(!failed.success);
        assert_eq!(failed.message, "Failed to submit report.");
    }
}
