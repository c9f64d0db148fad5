use std::io::Write;

use anyhow::Context;
use anyhow::Result;

use crate::app::builder::create_exporter;
use crate::app::builder::select_encoder;
use crate::config::ExporterArgs;
use crate::core::exporter::render;

/// Runs one scan pass over the watched directory and writes the rendered
/// metrics to `out`.
pub async fn run_scan(args: &ExporterArgs, out: &mut impl Write) -> Result<()> {
    let encoder = select_encoder(&args.metrics_format)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e:?}"))?;
    let exporter =
        create_exporter(args).map_err(|e| anyhow::anyhow!("Invalid configuration: {e:?}"))?;

    let snapshot = exporter
        .snapshot()
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    tracing::info!(
        files_seen = snapshot.report.files_seen,
        failed = snapshot.report.failed,
        channels = snapshot.channels.len(),
        "Scan completed"
    );

    let body = encoder
        .encode(&exporter.describe(), &render(&snapshot))
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    out.write_all(body.as_bytes())
        .context("write metrics to stdout failed")?;
    out.flush().context("flush stdout failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::TempDir;
    use test_log::test;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ExporterArgs,
    }

    #[test(tokio::test)]
    async fn prints_exposition_for_directory() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("parse.sh");
        std::fs::write(&script, "cat \"$2\"\n").unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir(&data).unwrap();
        std::fs::write(
            data.join("ch1.fast5"),
            r#"[{"rawDataLength": "500", "channelNumber": "1"}]"#,
        )
        .unwrap();

        let args = Harness::try_parse_from([
            "fast5-exporter",
            "--fast5-dir-path",
            data.to_str().unwrap(),
            "--extractor-program",
            "sh",
            "--extractor-args",
            script.to_str().unwrap(),
            "--labels",
            "site=lab",
        ])
        .unwrap()
        .args;

        let mut out = Vec::new();
        run_scan(&args, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("fast5_total_size{site=\"lab\"} 48"), "{text}");
        assert!(text.contains("fast5_amount_reads{channel=\"1\",site=\"lab\"} 1"));
        assert!(text.contains("fast5_max_raw_data_length{channel=\"1\",site=\"lab\"} 500"));
        assert!(text.contains("fast5_raw_data_length{channel=\"1\",site=\"lab\"} 500"));
    }
}
