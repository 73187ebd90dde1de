use std::fs;
use std::path::{Path, PathBuf};

use sitekeeper::models::{NoticeInput, NoticeKey, NoticeRef, SearchField, ValidationError};
use sitekeeper::{AppError, AttachmentChange, NoticeBoard, Settings, Site};

fn site(root: &Path) -> Site {
    Site::open(Settings { root: root.to_path_buf(), ..Settings::default() }).unwrap()
}

fn board(root: &Path) -> NoticeBoard {
    site(root).notices()
}

fn input(title: &str, content: &str, date: &str, badge: &str) -> NoticeInput {
    NoticeInput {
        title: title.into(),
        content: content.into(),
        date: date.into(),
        badge: badge.into(),
    }
}

fn key(title: &str, date: &str) -> NoticeRef {
    NoticeRef::Key(NoticeKey::new(title, date))
}

fn attachment_source(root: &Path, name: &str) -> PathBuf {
    let dir = root.join("incoming");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, b"attachment bytes").unwrap();
    path
}

#[test]
fn urgent_notice_is_stored_and_styled() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    b.submit(&input("Exam Results", "Results are out.", "2081/04/15", "Urgent"), None)
        .unwrap();

    let all = b.list().unwrap();
    assert_eq!(all.len(), 1);
    let n = &all[0].notice;
    assert_eq!(n.title, "Exam Results");
    assert_eq!(n.date.as_str(), "2081/04/15");
    assert_eq!(n.badge.label(), "Urgent");
    assert_eq!(n.badge.style().class_pair(), "bg-red-100 text-red-800");
    assert!(!all[0].has_file);
    assert!(n.created_at.is_some());

    let html = fs::read_to_string(dir.path().join("notice.html")).unwrap();
    assert!(html.contains(r#"<span class="badge bg-red-100 text-red-800">🔥 Urgent</span>"#));
    assert!(html.contains(r#"data-sort="20810415" data-date="2081/04/15""#));
    assert!(html.contains(&format!(r#"data-id="{}""#, n.id)));
}

#[test]
fn badge_search_ignores_case_and_padding() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    b.submit(&input("Fee deadline", "Pay by Friday.", "2081/05/01", "Important"), None)
        .unwrap();
    b.submit(&input("Library closed", "Renovation.", "2081/05/02", "IMPORTANT "), None)
        .unwrap();
    b.submit(&input("Picnic", "Bring lunch.", "2081/05/03", "Holiday"), None)
        .unwrap();

    let hits = b.search(SearchField::Badge, "important").unwrap();
    let titles: Vec<_> = hits.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["Library closed", "Fee deadline"]);

    assert_eq!(b.search(SearchField::Title, "  PICNIC ").unwrap().len(), 1);
    assert_eq!(b.search(SearchField::Content, "renovation").unwrap().len(), 1);
    assert_eq!(b.search(SearchField::Date, "2081/05").unwrap().len(), 3);
    assert!(b.search(SearchField::Badge, "urgent").unwrap().is_empty());
}

#[test]
fn list_is_newest_date_first() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    for (title, date) in [("b", "2080/01/05"), ("a", "2081/02/01"), ("c", "2079/12/30")] {
        b.submit(&input(title, "x", date, ""), None).unwrap();
    }
    let dates: Vec<_> = b
        .list()
        .unwrap()
        .into_iter()
        .map(|v| v.notice.date.to_string())
        .collect();
    assert_eq!(dates, ["2081/02/01", "2080/01/05", "2079/12/30"]);
}

#[test]
fn edit_replaces_the_whole_record() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    let original = b
        .submit(&input("Exam Results", "Old text.", "2081/04/15", "Urgent"), None)
        .unwrap();

    let updated = b
        .edit(
            &key("Exam Results", "2081/04/15"),
            &input("Final Timetable", "New text.", "2081/04/20", "Normal"),
            AttachmentChange::Keep,
        )
        .unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert!(b.search(SearchField::Title, "Exam Results").unwrap().is_empty());

    let hits = b.search(SearchField::Title, "Final Timetable").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "New text.");
    assert_eq!(hits[0].date.as_str(), "2081/04/20");
    assert_eq!(hits[0].badge.label(), "Normal");
    assert_eq!(b.list().unwrap().len(), 1);
}

#[test]
fn edit_validates_before_touching_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    b.submit(&input("Sports week", "Details soon.", "2081/06/01", ""), None)
        .unwrap();

    let err = b
        .edit(
            &key("Sports week", "2081/06/01"),
            &input("Sports week", "Details soon.", "2081/6/1", ""),
            AttachmentChange::Keep,
        )
        .unwrap_err();
    assert!(matches!(err, AppError::Invalid(ValidationError::BadDate(_))));
    assert_eq!(b.list().unwrap()[0].notice.date.as_str(), "2081/06/01");
}

#[test]
fn invalid_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());

    let err = b.submit(&input("  ", "body", "2081/01/01", ""), None).unwrap_err();
    assert!(matches!(err, AppError::Invalid(ValidationError::Missing("title"))));
    let err = b.submit(&input("t", "body", "2081-01-01", ""), None).unwrap_err();
    assert!(matches!(err, AppError::Invalid(ValidationError::BadDate(_))));
    assert_eq!(err.exit_code(), 1);

    assert!(!dir.path().join("notice.html").exists());
}

#[test]
fn missing_target_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    b.submit(&input("Present", "x", "2081/01/01", ""), None).unwrap();

    let err = b.remove(&key("Absent", "2081/01/01")).unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    let err = b
        .edit(&key("Present", "2081/01/02"), &input("P", "x", "2081/01/02", ""), AttachmentChange::Keep)
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    assert_eq!(b.list().unwrap().len(), 1);
}

#[test]
fn duplicate_keys_resolve_to_the_first_stored_record() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    let older = b.submit(&input("Meeting", "first", "2081/03/03", ""), None).unwrap();
    let newer = b.submit(&input("Meeting", "second", "2081/03/03", ""), None).unwrap();

    // most recent insert is stored first
    let removed = b.remove(&key("Meeting", "2081/03/03")).unwrap();
    assert_eq!(removed.id, newer.id);

    let left = b.list().unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].notice.id, older.id);
    b.remove(&NoticeRef::Id(older.id)).unwrap();
    assert!(b.list().unwrap().is_empty());
}

#[test]
fn attachment_gets_a_unique_name_under_the_upload_dir() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    let src = attachment_source(dir.path(), "exam routine.pdf");

    let n = b
        .submit(&input("Routine", "See file.", "2081/07/07", "Important"), Some(&src))
        .unwrap();
    let link = n.file_link.clone().unwrap();
    assert!(link.starts_with("notices/exam routine_"), "{link}");
    assert!(link.ends_with(".pdf"));
    assert_eq!(n.file_name().unwrap().len(), "exam routine_".len() + 8 + ".pdf".len());
    assert!(dir.path().join(&link).is_file());
    assert!(src.is_file());

    let html = fs::read_to_string(dir.path().join("notice.html")).unwrap();
    assert!(html.contains(&format!(r#"<a href="{link}" target="_blank" class="download-link text-blue-600">"#)));

    let view = &b.list().unwrap()[0];
    assert!(view.has_file && view.file_exists);
    assert_eq!(view.file_name.as_deref(), n.file_name());

    let info = b.attachment(&NoticeRef::Id(n.id)).unwrap().unwrap();
    assert_eq!(info.path, dir.path().join(&link));
    assert!(info.exists);
}

#[test]
fn missing_attachment_file_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    let src = attachment_source(dir.path(), "form.docx");
    let n = b.submit(&input("Forms", "x", "2081/07/08", ""), Some(&src)).unwrap();
    fs::remove_file(dir.path().join(n.file_link.as_deref().unwrap())).unwrap();

    let view = &b.list().unwrap()[0];
    assert!(view.has_file);
    assert!(!view.file_exists);
    assert!(!b.attachment(&NoticeRef::Id(n.id)).unwrap().unwrap().exists);

    // deleting still succeeds without the file
    b.remove(&NoticeRef::Id(n.id)).unwrap();
    assert!(b.list().unwrap().is_empty());
}

#[test]
fn delete_removes_its_own_attachment_only() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    let with_file = b
        .submit(&input("With file", "x", "2081/08/01", ""), Some(&attachment_source(dir.path(), "a.pdf")))
        .unwrap();
    let keeper = b
        .submit(&input("Keeper", "x", "2081/08/02", ""), Some(&attachment_source(dir.path(), "b.pdf")))
        .unwrap();
    let plain = b.submit(&input("Plain", "x", "2081/08/03", ""), None).unwrap();

    b.remove(&NoticeRef::Id(plain.id)).unwrap();
    b.remove(&key("With file", "2081/08/01")).unwrap();

    assert!(!dir.path().join(with_file.file_link.unwrap()).exists());
    assert!(dir.path().join(keeper.file_link.unwrap()).is_file());
    assert_eq!(b.list().unwrap().len(), 1);
}

#[test]
fn edit_replaces_or_detaches_the_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    let n = b
        .submit(&input("Circular", "x", "2081/09/01", ""), Some(&attachment_source(dir.path(), "v1.pdf")))
        .unwrap();
    let first = dir.path().join(n.file_link.clone().unwrap());
    let target = NoticeRef::Id(n.id);
    let fields = input("Circular", "x", "2081/09/01", "");

    let kept = b.edit(&target, &fields, AttachmentChange::Keep).unwrap();
    assert_eq!(kept.file_link, n.file_link);
    assert!(first.is_file());

    let replaced = b
        .edit(&target, &fields, AttachmentChange::Replace(attachment_source(dir.path(), "v2.pdf")))
        .unwrap();
    let second = dir.path().join(replaced.file_link.clone().unwrap());
    assert!(!first.exists());
    assert!(second.is_file());
    assert!(replaced.file_name().unwrap().starts_with("v2_"));

    let detached = b.edit(&target, &fields, AttachmentChange::Remove).unwrap();
    assert!(detached.file_link.is_none());
    assert!(!second.exists());
    assert!(!b.list().unwrap()[0].has_file);
}

#[test]
fn text_is_escaped_in_the_document_and_read_back_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    b.submit(&input("Q&A <session>", "Ask \"anything\" & more", "2081/10/01", ""), None)
        .unwrap();

    let html = fs::read_to_string(dir.path().join("notice.html")).unwrap();
    assert!(html.contains("Q&amp;A &lt;session&gt;"));

    let n = &b.list().unwrap()[0].notice;
    assert_eq!(n.title, "Q&A <session>");
    assert_eq!(n.content, "Ask \"anything\" & more");
    assert_eq!(n.badge.label(), "Normal");
}

#[test]
fn retitling_on_the_same_date_drops_the_old_title() {
    let dir = tempfile::tempdir().unwrap();
    let b = board(dir.path());
    let original = b
        .submit(&input("Exam Results", "Published today.", "2081/04/15", "Urgent"), None)
        .unwrap();

    b.edit(
        &key("Exam Results", "2081/04/15"),
        &input("Final Timetable", "Published today.", "2081/04/15", "Urgent"),
        AttachmentChange::Keep,
    )
    .unwrap();

    assert!(b.search(SearchField::Title, "Exam Results").unwrap().is_empty());
    let err = b.find(&key("Exam Results", "2081/04/15")).unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let found = b.find(&key("Final Timetable", "2081/04/15")).unwrap();
    assert_eq!(found.id, original.id);
    assert_eq!(b.list().unwrap().len(), 1);
}

#[test]
fn delete_leaves_files_outside_the_upload_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("site");
    let outside = dir.path().join("outside.txt");
    fs::write(&outside, b"not an upload").unwrap();

    let b = board(&root);
    let first = b
        .submit(&input("Edited by hand", "x", "2081/11/01", ""), Some(&attachment_source(&root, "a.pdf")))
        .unwrap();
    let second = b
        .submit(&input("Also edited", "x", "2081/11/02", ""), Some(&attachment_source(&root, "b.pdf")))
        .unwrap();

    // point both links out of the upload directory, as a hand edit might
    let page = root.join("notice.html");
    let html = fs::read_to_string(&page)
        .unwrap()
        .replace(first.file_link.as_deref().unwrap(), "../outside.txt")
        .replace(second.file_link.as_deref().unwrap(), "notices/../../outside.txt");
    fs::write(&page, html).unwrap();

    let b = board(&root);
    b.remove(&NoticeRef::Id(first.id)).unwrap();
    b.remove(&NoticeRef::Id(second.id)).unwrap();

    assert!(outside.is_file());
    assert!(b.list().unwrap().is_empty());
}
