use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub const GAME_ID: &str = "wdoor+floodgate-600-10F+alice+bob+20230101120000";

#[allow(dead_code)]
pub const FINISHED_RECORD: &str = "V2.2\n\
N+alice\n\
N-bob\n\
+\n\
+7776FU\n\
T10\n\
'** 30\n\
-3334FU\n\
T5\n\
%TORYO\n\
'$END_TIME:2023/01/01 12:30:00\n";

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Config pointing the record and list URLs at `base`
#[allow(dead_code)]
pub fn config_for_server(base: &str) -> String {
    format!(
        r#"
source:
  record_url: "{base}/games/{{game_id}}.csa"
  list_url: "{base}/games/history.log"
polling:
  throttle_ms: 100
  retry_delay_ms: 200
logging:
  level: warn
"#
    )
}
