//! Shared test utilities for integration tests
//!
//! Builds a small backend tree with nested sources, duplicate basenames
//! and commented code, used by the flatten/distribute tests.

use assert_fs::prelude::*;

/// Create `backend/` with a few TypeScript sources under `src/`.
pub fn make_backend_fixture() -> assert_fs::TempDir
{
    // Initialize the temporary project root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("backend/src/models/user.ts")
        .write_str("/**\n * User model\n */\nexport class User {}\n")
        .expect("write user.ts");

    // Quoted `//` must survive stripping
    tmp.child("backend/src/routes/index.ts")
        .write_str("const url = 'http://x'; // base\n\nexport default url;\n")
        .expect("write routes/index.ts");

    // Same basename as routes/index.ts
    tmp.child("backend/src/models/index.ts")
        .write_str("export * from './user';\n")
        .expect("write models/index.ts");

    // Pruned by the default ignore set
    tmp.child("backend/node_modules/pkg/index.js")
        .write_str("module.exports = 1;\n")
        .expect("write node_modules");

    tmp
}
