use anyhow::Context;
use tracing::info;

use filedb_core::app::{AddFileDatabaseForm, AppBuilder, UploadFilesForm};
use filedb_core::config::AppConfig;
use filedb_core::domain::UploadedFile;
use filedb_core::logging::{LogConfig, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LogConfig {
        verbose: std::env::args().any(|a| a == "-v" || a == "--verbose"),
    })?;

    // (A) 設定（環境変数、未設定なら一時ディレクトリ）
    let mut config = AppConfig::from_env().context("loading config from environment")?;
    let scratch = std::env::var_os("FILEDB_WORKSPACE").is_none();
    if scratch {
        config.workspace_root =
            std::env::temp_dir().join(format!("filedb-demo-{}", std::process::id()));
    }

    let app = AppBuilder::new()
        .config(config)
        .with_configured_storage()
        .await?
        .build()
        .await?;

    // (B) database 作成
    let db = app
        .submit_add_database(AddFileDatabaseForm {
            name: Some("Basin A".into()),
        })
        .await?;

    // (C) アップロード（フォーム経由）
    let form = UploadFilesForm {
        name: Some("Survey1".into()),
        notes: Some("demo upload".into()),
        database_select: Some(db.id.to_string()),
    };
    let files = vec![UploadedFile::new("a.csv", b"x,y\n1,2\n".to_vec())];
    let collection = app.submit_upload(form, files).await?;
    info!(collection_id = %collection.id, "uploaded");

    // (D) 一覧
    println!("{}", serde_json::to_string_pretty(&app.list_databases().await?)?);
    println!(
        "{}",
        serde_json::to_string_pretty(&app.list_collections(db.id).await?)?
    );

    // (E) 後片付け
    app.delete_database(db.id).await?;
    println!("home: {:?}", app.home().await?.map(|dbs| dbs.len()));

    if scratch {
        std::fs::remove_dir_all(app.workspace().path())
            .with_context(|| format!("removing {}", app.workspace().path().display()))?;
    }
    Ok(())
}
