use crate::domain::model::CaptureTask;
use crate::domain::ports::Storage;
use crate::domain::settings::StatePaths;
use crate::utils::error::Result;
use regex::Regex;
use std::sync::OnceLock;

/// 暖機截圖的保留檔名，不屬於任何 case
pub const WARMUP_ARTIFACT: &str = "_warmup_screenshot.png";

pub const MAX_SLUG_LEN: usize = 30;

/// 取 URL 最後兩個非空片段以 `_` 相接，並截斷至 [`MAX_SLUG_LEN`] 字元
pub fn url_slug(url: &str) -> String {
    let parts: Vec<&str> = url.split('/').filter(|p| !p.is_empty()).collect();
    let tail = &parts[parts.len().saturating_sub(2)..];

    tail.join("_")
        .chars()
        .map(|c| match c {
            ':' | '?' | '*' | '"' | '<' | '>' | '|' | '\\' | '#' | '&' | '=' => '-',
            c => c,
        })
        .take(MAX_SLUG_LEN)
        .collect()
}

pub fn artifact_file_name(task: &CaptureTask) -> String {
    if task.warmup {
        return WARMUP_ARTIFACT.to_string();
    }

    format!(
        "{}_{}_{}_{}.png",
        task.role,
        task.pair.index,
        task.device.name,
        url_slug(task.url())
    )
}

pub fn artifact_path(dir: &str, task: &CaptureTask) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), artifact_file_name(task))
}

fn leading_number(file_name: &str) -> usize {
    static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
    NUMBER
        .get_or_init(|| Regex::new(r"\d+").ok())
        .as_ref()
        .and_then(|re| re.find(file_name))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// 列出目錄中的截圖（略過暖機檔），依檔名中的 case 編號排序
pub async fn list_indexed_artifacts<S: Storage>(storage: &S, dir: &str) -> Result<Vec<String>> {
    let mut files: Vec<String> = storage
        .list_dir(dir)
        .await?
        .into_iter()
        .filter(|name| name != WARMUP_ARTIFACT && name.ends_with(".png"))
        .collect();

    files.sort_by_key(|name| leading_number(name));
    Ok(files)
}

/// 上一次執行是否留下截圖；兩個目錄都不存在或都是空的就是第一次執行
pub async fn has_previous_artifacts<S: Storage>(storage: &S, paths: &StatePaths) -> Result<bool> {
    for dir in [&paths.original_dir, &paths.staging_dir] {
        if !storage.list_dir(dir).await?.is_empty() {
            return Ok(true);
        }
    }
    Ok(false)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPairing {
    pub pairs: Vec<(String, String)>,
    pub unmatched: Vec<String>,
}

/// 為每張 original 截圖找出同名的 staging 截圖，找不到的另外列出
pub fn pair_artifacts(originals: &[String], stagings: &[String]) -> ArtifactPairing {
    let mut pairing = ArtifactPairing::default();

    for original in originals {
        let staging = original.replacen("original", "staging", 1);
        if stagings.contains(&staging) {
            pairing.pairs.push((original.clone(), staging));
        } else {
            tracing::warn!(
                "Matching staging file not found for {}, skipping.",
                original
            );
            pairing.unmatched.push(original.clone());
        }
    }

    pairing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::devices;
    use crate::domain::model::{DeviceName, MatchedPair, Role};

    #[test]
    fn test_url_slug_uses_last_two_segments() {
        assert_eq!(url_slug("https://example.com/products/widget"), "products_widget");
        assert_eq!(url_slug("https://example.com/a/b/c/"), "b_c");
        assert_eq!(url_slug("https://example.com/"), "https-_example.com");
    }

    #[test]
    fn test_url_slug_is_length_capped() {
        let slug = url_slug("https://example.com/category/a-very-long-product-name-that-keeps-going");
        assert_eq!(slug.chars().count(), MAX_SLUG_LEN);
        assert!(slug.starts_with("category_a-very-long"));
    }

    #[test]
    fn test_artifact_file_name_for_indexed_task() {
        let pair = MatchedPair::new(
            5,
            "https://prod.example.com/products/widget",
            "https://stage.example.com/products/widget",
        );
        let task = CaptureTask::new(pair, devices::profile(DeviceName::Tablet), Role::Original);

        assert_eq!(
            artifact_file_name(&task),
            "original_5_tablet_products_widget.png"
        );
        assert_eq!(
            artifact_path("original_scr/", &task),
            "original_scr/original_5_tablet_products_widget.png"
        );
    }

    #[test]
    fn test_warmup_task_uses_reserved_name() {
        let pair = MatchedPair::new(0, "https://a.com/x", "https://b.com/x");
        let task = CaptureTask::warmup(pair, devices::profile(DeviceName::Desktop), Role::Staging);
        assert_eq!(artifact_file_name(&task), WARMUP_ARTIFACT);
    }

    #[test]
    fn test_pair_artifacts_reports_missing_staging() {
        let originals = vec![
            "original_1_desktop_a_b.png".to_string(),
            "original_2_desktop_c_d.png".to_string(),
        ];
        let stagings = vec!["staging_1_desktop_a_b.png".to_string()];

        let pairing = pair_artifacts(&originals, &stagings);
        assert_eq!(pairing.pairs.len(), 1);
        assert_eq!(pairing.pairs[0].1, "staging_1_desktop_a_b.png");
        assert_eq!(pairing.unmatched, vec!["original_2_desktop_c_d.png".to_string()]);
    }

    #[test]
    fn test_leading_number_sorting_key() {
        assert_eq!(leading_number("original_12_mobile_x.png"), 12);
        assert_eq!(leading_number(WARMUP_ARTIFACT), 0);
    }
}
