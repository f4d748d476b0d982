pub mod cancel_stale_runs;
