/*! Integration tests for Refract.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - record: Tests for the RecordData commit state machine and payload merge
 * - projections: Tests for base/projection aliasing, fan-out and lifecycle
 * - resolve: Tests for schema-driven attribute resolution and caching
 * - arrays: Tests for ManagedArray/TrackedArray replace semantics
 * - store: Tests for the in-memory store bridge and notification batching
 * - scenarios: End-to-end fixtures for the cross-component contracts
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("refract=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod arrays;
mod helpers;
mod scenarios;
mod store;
