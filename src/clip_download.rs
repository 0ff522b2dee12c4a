use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

/// Clip files the built-in character needs on disk.
pub const CLIP_PACK_FILES: &[&str] = &[
    "cheer-leader.gif",
    "dancing.gif",
    "yah.gif",
    "negative/angry.gif",
    "chilling.gif",
    "showcase.gif",
];

const CLIP_PACK_BASE_URL: &str =
    "https://raw.githubusercontent.com/ann-ai/character-clips/refs/heads/main/clips";

#[derive(Clone, Debug)]
pub enum ClipDownloadEvent {
    AlreadyPresent,
    Started {
        total: Option<u64>,
    },
    /// Cumulative bytes across all files being fetched.
    Progress {
        downloaded: u64,
        total: Option<u64>,
    },
    Finished,
}

/// Clip files not yet present under the pack directory.
pub fn missing_clip_files(clips_dir: &Path) -> Vec<&'static str> {
    CLIP_PACK_FILES
        .iter()
        .copied()
        .filter(|name| !clips_dir.join(name).exists())
        .collect()
}

/// Make sure every clip of the pack exists under `clips_dir`, downloading any
/// missing files. Events report aggregate progress; a terminal progress bar
/// mirrors them for console launches.
pub fn ensure_clip_pack_available_with_callback<F>(
    clips_dir: &Path,
    mut on_event: F,
) -> anyhow::Result<()>
where
    F: FnMut(ClipDownloadEvent),
{
    let missing = missing_clip_files(clips_dir);
    if missing.is_empty() {
        on_event(ClipDownloadEvent::AlreadyPresent);
        on_event(ClipDownloadEvent::Finished);
        return Ok(());
    }

    log::info!("clip pack incomplete, fetching {} file(s)", missing.len());
    on_event(ClipDownloadEvent::Started { total: None });

    let progress = create_progress_bar();
    let client = Client::new();
    let mut downloaded_total: u64 = 0;

    for name in missing {
        let dest = clips_dir.join(name);
        download_clip(&client, name, &dest, &mut |downloaded| {
            progress.set_position(downloaded_total + downloaded);
            on_event(ClipDownloadEvent::Progress {
                downloaded: downloaded_total + downloaded,
                total: None,
            });
        })
        .with_context(|| format!("failed to fetch clip {name}"))?;

        downloaded_total = progress.position();
    }

    progress.finish_with_message("clip pack ready");
    on_event(ClipDownloadEvent::Finished);
    Ok(())
}

fn download_clip<F>(
    client: &Client,
    name: &str,
    dest: &Path,
    on_progress: &mut F,
) -> anyhow::Result<()>
where
    F: FnMut(u64),
{
    let url = format!("{CLIP_PACK_BASE_URL}/{name}");
    log::info!("downloading clip from {url} to {}", dest.display());

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create clip directory {}", parent.display()))?;
    }

    let mut response = client
        .get(&url)
        .send()
        .context("failed to start clip download")?
        .error_for_status()
        .context("clip download returned error status")?;

    let tmp_path = dest.with_extension("download");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .context("failed while reading clip bytes")?;
        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .context("failed while writing clip to disk")?;
        downloaded += bytes_read as u64;
        on_progress(downloaded);
    }

    file.sync_all()
        .context("failed to flush downloaded clip to disk")?;
    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to move temp clip {} into place at {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    Ok(())
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} fetching clip pack {bytes}")
        .unwrap()
        .progress_chars("=>-");
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Directory the running app keeps its clip pack in, resolved relative to the
/// working directory.
pub fn default_pack_dir() -> PathBuf {
    crate::services::default_clips_dir()
}
