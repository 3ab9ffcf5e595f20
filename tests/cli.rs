//! CLI integration tests for taleweave init and admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;
use std::sync::Arc;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use taleweave::accounts::{AccountService, NewAccount};
use taleweave::ident::IdentifierAllocator;
use taleweave::store::{SqliteStore, Store};
use taleweave::types::Tier;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taleweave").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["init", "--data-dir", &self.data_dir_str()])
            .assert()
    }

    fn admin(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        let data_dir = self.data_dir_str();
        let mut all = vec!["admin", "--data-dir", data_dir.as_str()];
        all.extend_from_slice(args);
        self.cmd().args(all).assert()
    }

    fn store(&self) -> Arc<dyn Store> {
        let store = SqliteStore::new(self.data_dir().join("taleweave.db")).expect("open store");
        Arc::new(store)
    }

    fn add_account(&self, name: &str, email: &str) -> String {
        let store = self.store();
        let allocator = Arc::new(IdentifierAllocator::new(store.clone(), "taleweave.site"));
        let accounts = AccountService::new(store, allocator);
        accounts
            .register(NewAccount {
                name: name.to_string(),
                email: email.to_string(),
                password: "correct horse".to_string(),
                preferred_domain: None,
            })
            .expect("register account")
            .id
    }
}

#[test]
fn test_help_lists_commands() {
    let ctx = TestContext::new();
    ctx.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("admin"));
}

#[test]
fn test_init_creates_database() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Initialized database"));

    ctx.temp_dir
        .child("taleweave.db")
        .assert(predicate::path::exists());
    ctx.temp_dir
        .child("assets")
        .assert(predicate::path::is_dir());
}

#[test]
fn test_init_twice_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.init()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_serve_requires_init() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["serve", "--data-dir", &ctx.data_dir_str(), "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("taleweave init"));
}

#[test]
fn test_admin_requires_init() {
    let ctx = TestContext::new();

    ctx.admin(&["recount"])
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_set_tier() {
    let ctx = TestContext::new();
    ctx.init().success();
    let account_id = ctx.add_account("Rivera Family", "rivera@example.com");

    ctx.admin(&["set-tier", "--email", "Rivera@Example.com", "--tier", "pro"])
        .success()
        .stdout(predicate::str::contains("pro tier"))
        .stdout(predicate::str::contains("0 of 1500"));

    let account = ctx
        .store()
        .get_account(&account_id)
        .unwrap()
        .expect("account exists");
    assert_eq!(account.tier, Tier::Pro);
}

#[test]
fn test_set_tier_unknown_tier() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_account("Rivera Family", "rivera@example.com");

    ctx.admin(&["set-tier", "--email", "rivera@example.com", "--tier", "platinum"])
        .failure()
        .stderr(predicate::str::contains("Unknown tier 'platinum'"));
}

#[test]
fn test_set_tier_unknown_email() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.admin(&["set-tier", "--email", "nobody@example.com", "--tier", "basic"])
        .failure()
        .stderr(predicate::str::contains("No account with email"));
}

#[test]
fn test_recount_fixes_drifted_counts() {
    let ctx = TestContext::new();
    ctx.init().success();
    let account_id = ctx.add_account("Okafor", "okafor@example.com");

    // Simulate a drifted cached count.
    {
        let store = SqliteStore::new(ctx.data_dir().join("taleweave.db")).unwrap();
        store
            .connection()
            .execute(
                "UPDATE accounts SET content_count = 42 WHERE id = ?1",
                [&account_id],
            )
            .unwrap();
    }

    ctx.admin(&["recount"])
        .success()
        .stdout(predicate::str::contains(format!("{account_id}\t0")))
        .stdout(predicate::str::contains("Recomputed 1 accounts"));

    let account = ctx.store().get_account(&account_id).unwrap().unwrap();
    assert_eq!(account.content_count, 0);
}
