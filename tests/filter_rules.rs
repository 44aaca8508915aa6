// tests/filter_rules.rs

mod common;
use crate::common::builders::JobConfigBuilder;
use crate::common::file_event;

use proptest::prelude::*;

use dirwatch::job::VIDEO_EXTENSIONS;
use dirwatch::types::EventKind;
use dirwatch::watch::{check, should_run, Verdict};

#[test]
fn no_rules_accepts_everything() {
    let job = JobConfigBuilder::new("/w", "true").compile("j");
    assert!(should_run(&job, &file_event("/w/anything.bin", EventKind::Create)));
}

#[test]
fn include_list_matches_suffix_of_full_path() {
    let job = JobConfigBuilder::new("/w", "true").include_ext(".txt").compile("j");

    assert_eq!(check(&job, &file_event("/w/a.txt", EventKind::Create)), Verdict::Accept);
    assert_eq!(check(&job, &file_event("/w/a.log", EventKind::Create)), Verdict::NotIncluded);
    // Plain suffix: no dot boundary required.
    assert_eq!(check(&job, &file_event("/w/notes.atxt", EventKind::Create)), Verdict::NotIncluded);
    assert_eq!(check(&job, &file_event("/w/a.tar.txt", EventKind::Create)), Verdict::Accept);
}

#[test]
fn exclude_list_rejects_matching_suffix() {
    let job = JobConfigBuilder::new("/w", "true").exclude_ext(".tmp").compile("j");

    assert_eq!(
        check(&job, &file_event("/w/upload.tmp", EventKind::CloseWrite)),
        Verdict::ExcludedExtension
    );
    assert_eq!(check(&job, &file_event("/w/upload.dat", EventKind::CloseWrite)), Verdict::Accept);
}

#[test]
fn include_is_checked_before_exclude() {
    let job = JobConfigBuilder::new("/w", "true")
        .include_ext(".txt")
        .exclude_ext(".txt")
        .compile("j");

    assert_eq!(
        check(&job, &file_event("/w/a.txt", EventKind::Create)),
        Verdict::ExcludedExtension
    );
    assert_eq!(check(&job, &file_event("/w/a.md", EventKind::Create)), Verdict::NotIncluded);
}

#[test]
fn exclude_pattern_is_searched_in_basename_only() {
    let job = JobConfigBuilder::new("/w", "true").exclude_re(r"^\.").compile("j");

    assert_eq!(
        check(&job, &file_event("/w/.hidden", EventKind::Create)),
        Verdict::ExcludedPattern
    );
    // A dot directory higher up does not count.
    assert_eq!(check(&job, &file_event("/w/.git/config", EventKind::Create)), Verdict::Accept);
}

#[test]
fn exclude_pattern_is_a_search_not_a_full_match() {
    let job = JobConfigBuilder::new("/w", "true").exclude_re("part").compile("j");
    assert_eq!(
        check(&job, &file_event("/w/movie.partial.mkv", EventKind::Create)),
        Verdict::ExcludedPattern
    );
}

#[test]
fn video_alias_accepts_media_and_rejects_text() {
    let job = JobConfigBuilder::new("/w", "true").include_ext("video").compile("j");

    assert!(should_run(&job, &file_event("/w/holiday.mkv", EventKind::Create)));
    assert!(should_run(&job, &file_event("/w/clip.mp4", EventKind::Create)));
    assert!(!should_run(&job, &file_event("/w/readme.txt", EventKind::Create)));
}

proptest! {
    #[test]
    fn video_alias_equals_explicit_extension_list(
        stem in "[a-z0-9_]{1,12}",
        ext in prop::sample::select(VIDEO_EXTENSIONS.to_vec()),
        other in "\\.[a-z]{1,4}",
    ) {
        let alias = JobConfigBuilder::new("/w", "true").include_ext("video").compile("alias");
        let mut explicit = JobConfigBuilder::new("/w", "true");
        for e in VIDEO_EXTENSIONS {
            explicit = explicit.include_ext(e);
        }
        let explicit = explicit.compile("explicit");

        for path in [format!("/w/{stem}{ext}"), format!("/w/{stem}{other}")] {
            let event = file_event(&path, EventKind::Create);
            prop_assert_eq!(should_run(&alias, &event), should_run(&explicit, &event));
        }
        let video_path = format!("/w/{stem}{ext}");
        prop_assert!(should_run(&alias, &file_event(video_path, EventKind::Create)));
    }

    #[test]
    fn excluded_extension_never_runs(
        stem in "[a-zA-Z0-9 _-]{1,16}",
        ext in "\\.[a-z]{1,5}",
    ) {
        let job = JobConfigBuilder::new("/w", "true").exclude_ext(&ext).compile("j");
        let event = file_event(format!("/w/sub/{stem}{ext}"), EventKind::Modify);
        prop_assert!(!should_run(&job, &event));
    }
}
