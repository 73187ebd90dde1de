use std::env;
use std::path::{Path, PathBuf};

use serial_test::serial;
use sitekeeper::{Backend, Settings};

const VARS: [&str; 7] = [
    "SITEKEEPER_ROOT",
    "SITEKEEPER_BACKEND",
    "SITEKEEPER_DATA_DIR",
    "BANNER_HTML",
    "BANNER_MEDIA_DIR",
    "NOTICE_HTML",
    "NOTICE_UPLOAD_DIR",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_without_env() {
    clear_env();
    let s = Settings::from_env().unwrap();
    assert_eq!(s.backend, Backend::Html);
    assert_eq!(s.banner_html_path(), Path::new(".").join("banner.html"));
    assert_eq!(s.media_href(), "./banner/banner_img/");
    assert_eq!(s.upload_link_prefix(), "notices");
}

#[test]
#[serial]
fn env_overrides_resolve_against_root() {
    clear_env();
    env::set_var("SITEKEEPER_ROOT", "/srv/school");
    env::set_var("SITEKEEPER_BACKEND", "Snapshot");
    env::set_var("BANNER_MEDIA_DIR", "./media/slides/");
    env::set_var("NOTICE_HTML", "/var/www/notice.html");
    env::set_var("NOTICE_UPLOAD_DIR", "files/notices");

    let s = Settings::from_env().unwrap();
    clear_env();

    assert_eq!(s.backend, Backend::Snapshot);
    assert_eq!(s.media_dir_path(), PathBuf::from("/srv/school/./media/slides/"));
    assert_eq!(s.media_href(), "./media/slides/");
    assert_eq!(s.notice_html_path(), PathBuf::from("/var/www/notice.html"));
    assert_eq!(s.data_dir_path(), PathBuf::from("/srv/school/data"));
    assert_eq!(s.upload_link_prefix(), "files/notices");
}

#[test]
#[serial]
fn blank_values_fall_back_to_defaults() {
    clear_env();
    env::set_var("BANNER_HTML", "   ");
    env::set_var("SITEKEEPER_BACKEND", "");
    let s = Settings::from_env().unwrap();
    clear_env();
    assert_eq!(s.banner_html, PathBuf::from("banner.html"));
    assert_eq!(s.backend, Backend::Html);
}

#[test]
#[serial]
fn unknown_backend_is_rejected() {
    clear_env();
    env::set_var("SITEKEEPER_BACKEND", "sqlite");
    let err = Settings::from_env().unwrap_err();
    clear_env();
    assert!(format!("{err:#}").contains("sqlite"));
}

#[test]
fn absolute_upload_dir_links_absolutely() {
    let s = Settings { notice_upload_dir: PathBuf::from("/data/uploads/"), ..Settings::default() };
    assert_eq!(s.upload_link_prefix(), "/data/uploads");
}
