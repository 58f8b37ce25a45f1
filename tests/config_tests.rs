//! Tests for the type-safe configuration builder pattern

use dualcrawl::config::CrawlConfig;
use dualcrawl::crawl_engine::Phase;
use dualcrawl::ThrottleConfig;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_builder_requires_storage_dir_and_test_url() {
    // These should not compile if uncommented:
    // let config = CrawlConfig::builder().build();
    // let config = CrawlConfig::builder()
    //     .storage_dir(PathBuf::from("/tmp"))
    //     .build();

    let temp_dir = TempDir::new().unwrap();
    let config = CrawlConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .test_url("https://stage.example.com")
        .build()
        .unwrap();

    assert_eq!(config.storage_dir(), temp_dir.path());
    assert_eq!(config.test_url(), "https://stage.example.com");
    assert!(!config.is_mirrored());
}

#[tokio::test]
async fn test_builder_optional_fields_have_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = CrawlConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .test_url("https://stage.example.com")
        .build()
        .unwrap();

    assert_eq!(config.reference_url(), None);
    assert_eq!(config.max_depth(), 2);
    assert!(!config.save_screenshots());
    assert!(!config.pair_by_query());
    assert!(!config.hash_query());
    assert!(!config.capture_console());
    assert!(config.headless());
    assert_eq!(config.target_lang(), None);
    assert!(config.strip_selectors().is_empty());
    assert_eq!(config.error_log_dsn(Phase::Reference), None);
    assert_eq!(config.error_log_dsn(Phase::Test), None);
    assert!(config.throttle().enabled);
    assert_eq!(config.navigation_timeout(), Duration::from_secs(60));
    assert_eq!(config.log_path(), temp_dir.path().join("log.txt"));
}

#[tokio::test]
async fn test_builder_with_all_optional_fields() {
    let temp_dir = TempDir::new().unwrap();
    let config = CrawlConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .test_url("stage.example.com")
        .reference_url("www.example.com")
        .max_depth(5)
        .save_screenshots(true)
        .pair_by_query(true)
        .hash_query(true)
        .target_lang(Some("de".to_string()))
        .strip_selectors(vec!["#cookie".to_string(), ".ads".to_string()])
        .reference_error_log_dsn(Some("mysql://u:p@db.example.com/live".to_string()))
        .test_error_log_dsn(Some("mariadb://u:p@db.example.com/stage".to_string()))
        .capture_console(true)
        .max_concurrent_pages(4)
        .max_concurrent_per_domain(2)
        .navigation_timeout_secs(15)
        .log_file_name("metrics.csv")
        .chrome_data_dir(Some(PathBuf::from("/tmp/profile")))
        .build()
        .unwrap();

    // Scheme is assumed when missing
    assert_eq!(config.test_url(), "https://stage.example.com");
    assert_eq!(config.reference_url(), Some("https://www.example.com"));
    assert!(config.is_mirrored());
    assert_eq!(config.max_depth(), 5);
    assert!(config.save_screenshots());
    assert!(config.pair_by_query());
    assert!(config.hash_query());
    assert_eq!(config.target_lang(), Some("de"));
    assert_eq!(config.strip_selectors(), ["#cookie", ".ads"]);
    assert_eq!(
        config.error_log_dsn(Phase::Test),
        Some("mariadb://u:p@db.example.com/stage")
    );
    assert!(config.capture_console());
    assert_eq!(config.max_concurrent_pages(), 4);
    assert_eq!(config.max_concurrent_per_domain(), 2);
    assert_eq!(config.navigation_timeout(), Duration::from_secs(15));
    assert_eq!(config.log_path(), temp_dir.path().join("metrics.csv"));
    assert_eq!(config.chrome_data_dir(), Some(&PathBuf::from("/tmp/profile")));
}

#[tokio::test]
async fn test_invalid_urls_are_rejected() {
    let temp_dir = TempDir::new().unwrap();

    let result = CrawlConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .test_url("https://")
        .build();
    assert!(result.is_err());

    let result = CrawlConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .test_url("https://stage.example.com")
        .reference_url("http://exa mple.com")
        .build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_scheme_detection_ignores_case() {
    let temp_dir = TempDir::new().unwrap();
    let config = CrawlConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .test_url("HTTP://stage.example.com")
        .reference_url("Https://www.example.com")
        .build()
        .unwrap();

    assert_eq!(config.test_url(), "HTTP://stage.example.com");
    assert_eq!(config.reference_url(), Some("Https://www.example.com"));
}

#[tokio::test]
async fn test_zero_navigation_timeout_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let result = CrawlConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .test_url("https://stage.example.com")
        .navigation_timeout_secs(0)
        .build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_malformed_error_log_dsn_is_rejected() {
    let temp_dir = TempDir::new().unwrap();

    for dsn in ["postgres://u:p@db/site", "mysql://u:p@db.example.com", "not a dsn"] {
        let result = CrawlConfig::builder()
            .storage_dir(temp_dir.path().to_path_buf())
            .test_url("https://stage.example.com")
            .test_error_log_dsn(Some(dsn.to_string()))
            .build();
        assert!(result.is_err(), "{dsn} should be rejected");
    }
}

#[tokio::test]
async fn test_concurrency_and_throttle_bounds() {
    let temp_dir = TempDir::new().unwrap();

    let result = CrawlConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .test_url("https://stage.example.com")
        .max_concurrent_pages(0)
        .build();
    assert!(result.is_err());

    let result = CrawlConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .test_url("https://stage.example.com")
        .throttle_delays(
            Duration::from_secs(1),
            Duration::from_secs(10),
            Duration::from_secs(5),
        )
        .build();
    assert!(result.is_err());

    for target_concurrency in [0.0, 1e-300, f64::NAN, -1.0] {
        let result = CrawlConfig::builder()
            .storage_dir(temp_dir.path().to_path_buf())
            .test_url("https://stage.example.com")
            .throttle(ThrottleConfig {
                target_concurrency,
                ..ThrottleConfig::default()
            })
            .build();
        assert!(result.is_err(), "{target_concurrency} should be rejected");
    }

    let config = CrawlConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .test_url("https://stage.example.com")
        .throttle(ThrottleConfig::disabled())
        .build()
        .unwrap();
    assert!(!config.throttle().enabled);
}
