use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("bookshelf")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("serve"))
        .stdout(contains("migrate"));
}

#[test]
fn migrate_against_in_memory_database() {
    Command::cargo_bin("bookshelf")
        .unwrap()
        .env("BOOKSHELF_CONFIG_DIR", std::env::temp_dir().join("bookshelf-cli-no-config"))
        .args(["--database-url", "sqlite::memory:", "migrate"])
        .assert()
        .success();
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("bookshelf")
        .unwrap()
        .arg("shelve")
        .assert()
        .failure();
}
