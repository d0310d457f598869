use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const PERSON_H: &str = r#"
#import <Foundation/Foundation.h>

NS_ASSUME_NONNULL_BEGIN

@interface Person : NSObject
@property (nonatomic, copy) NSString *name;
- (NSString *)greet;
@end

NS_ASSUME_NONNULL_END
"#;

const PERSON_M: &str = r#"
#import "Person.h"

@implementation Person
- (NSString *)greet {
    return self.name;
}
@end
"#;

fn uplift() -> Command {
    Command::cargo_bin("uplift").expect("binary builds")
}

#[test]
fn translates_a_directory_to_stdout() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Person.h"), PERSON_H).unwrap();
    fs::write(dir.path().join("Person.m"), PERSON_M).unwrap();

    uplift()
        .arg("translate")
        .arg(dir.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("class Person: NSObject {"))
        .stdout(predicate::str::contains("import Foundation"))
        .stdout(predicate::str::contains("func greet() -> String"));
}

#[test]
fn writes_swift_files_into_the_output_directory() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(dir.path().join("Person.h"), PERSON_H).unwrap();
    fs::write(dir.path().join("Person.m"), PERSON_M).unwrap();

    uplift()
        .arg("translate")
        .arg(dir.path())
        .arg("--quiet")
        .arg("--output")
        .arg(out.path())
        .assert()
        .success();

    let written = fs::read_to_string(out.path().join("Person.swift")).unwrap();
    assert!(written.contains("var name: String"));
}

#[test]
fn json_format_dumps_the_intention_graph() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Person.h"), PERSON_H).unwrap();

    let output = uplift()
        .arg("translate")
        .arg(dir.path())
        .arg("--quiet")
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let graph: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert!(graph.get("nodes").is_some());
}

#[test]
fn missing_input_path_fails() {
    uplift()
        .arg("translate")
        .arg("definitely/not/here")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn directory_without_objc_sources_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "nothing to do").unwrap();

    uplift()
        .arg("translate")
        .arg(dir.path())
        .arg("--quiet")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no Objective-C sources"));
}

#[test]
fn unknown_constructs_survive_as_comments() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("Legacy.m"),
        r#"
@implementation Legacy
- (void)jump {
    goto fail;
}
@end
"#,
    )
    .unwrap();

    uplift()
        .arg("translate")
        .arg(dir.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("goto fail"));
}
