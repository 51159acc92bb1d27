//! Integration tests for filesync-drive
//!
//! Uses wiremock to simulate the Google Drive v3 API and verifies
//! end-to-end behavior of the DriveClient, listing pagination, resumable
//! uploads, downloads and folder resolution.

mod common;

mod test_folders;
mod test_listing;
mod test_transfer;
