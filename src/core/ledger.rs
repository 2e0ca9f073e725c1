use crate::domain::model::MatchedPair;
use crate::domain::ports::Storage;
use crate::domain::settings::StatePaths;
use crate::utils::error::{Result, TwinshotError};
use std::collections::HashSet;

/// 依目前位置重新編號（1-based）
pub fn reindex(pairs: Vec<MatchedPair>) -> Vec<MatchedPair> {
    pairs
        .into_iter()
        .enumerate()
        .map(|(i, pair)| pair.with_index(i + 1))
        .collect()
}

/// 把 case 編號對應到目前 active 清單中的 pair；超出範圍者另外回傳
pub fn resolve_cases(active: &[MatchedPair], case_numbers: &[usize]) -> (Vec<MatchedPair>, Vec<usize>) {
    let mut selected: Vec<MatchedPair> = Vec::new();
    let mut invalid = Vec::new();

    for &case in case_numbers {
        match case.checked_sub(1).and_then(|i| active.get(i)) {
            Some(pair) => {
                if !selected.iter().any(|p| p.index == case) {
                    selected.push(pair.clone().with_index(case));
                }
            }
            None => invalid.push(case),
        }
    }

    (selected, invalid)
}

/// JSON 狀態檔的讀寫；active 與 excluded 都以成對清單儲存，長度不一致時拒絕載入
#[derive(Debug, Clone)]
pub struct LedgerStore<S: Storage> {
    storage: S,
    paths: StatePaths,
}

impl<S: Storage> LedgerStore<S> {
    pub fn new(storage: S, paths: StatePaths) -> Self {
        Self { storage, paths }
    }

    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    pub async fn load_active(&self) -> Result<Vec<MatchedPair>> {
        let original = self.read_list(&self.paths.original_urls).await?;
        let staging = self.read_list(&self.paths.staging_urls).await?;
        MatchedPair::zip_lists(original, staging)
    }

    pub async fn save_active(&self, pairs: &[MatchedPair]) -> Result<()> {
        let (original, staging) = MatchedPair::unzip_lists(pairs);
        self.write_list(&self.paths.original_urls, &original).await?;
        self.write_list(&self.paths.staging_urls, &staging).await
    }

    /// 沒有 excluded 檔案時視為空清單
    pub async fn load_excluded(&self) -> Result<Vec<MatchedPair>> {
        if !self.has_excluded().await {
            return Ok(Vec::new());
        }
        let original = self.read_list(&self.paths.excluded_original_urls).await?;
        let staging = self.read_list(&self.paths.excluded_staging_urls).await?;
        MatchedPair::zip_lists(original, staging)
    }

    pub async fn save_excluded(&self, pairs: &[MatchedPair]) -> Result<()> {
        let (original, staging) = MatchedPair::unzip_lists(pairs);
        self.write_list(&self.paths.excluded_original_urls, &original).await?;
        self.write_list(&self.paths.excluded_staging_urls, &staging).await
    }

    pub async fn clear_excluded(&self) -> Result<()> {
        for path in [
            &self.paths.excluded_original_urls,
            &self.paths.excluded_staging_urls,
        ] {
            if self.storage.exists(path).await {
                self.storage.remove_file(path).await?;
            }
        }
        Ok(())
    }

    pub async fn has_excluded(&self) -> bool {
        self.storage.exists(&self.paths.excluded_original_urls).await
            && self.storage.exists(&self.paths.excluded_staging_urls).await
    }

    pub async fn missing_files(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for path in [
            &self.paths.original_urls,
            &self.paths.staging_urls,
            &self.paths.excluded_original_urls,
            &self.paths.excluded_staging_urls,
        ] {
            if !self.storage.exists(path).await {
                missing.push(path.clone());
            }
        }
        missing
    }

    async fn read_list(&self, path: &str) -> Result<Vec<String>> {
        let data = self.storage.read_file(path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn write_list(&self, path: &str, urls: &[String]) -> Result<()> {
        let data = serde_json::to_vec_pretty(urls)?;
        self.storage.write_file(path, &data).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionReport {
    pub excluded: Vec<MatchedPair>,
    pub invalid: Vec<usize>,
    pub remaining: usize,
}

/// 跨多次執行的 Active ⇄ Excluded 帳本
#[derive(Debug, Clone)]
pub struct CaseLedger<S: Storage> {
    store: LedgerStore<S>,
}

impl<S: Storage> CaseLedger<S> {
    pub fn new(storage: S, paths: StatePaths) -> Self {
        Self {
            store: LedgerStore::new(storage, paths),
        }
    }

    pub fn store(&self) -> &LedgerStore<S> {
        &self.store
    }

    pub async fn active(&self) -> Result<Vec<MatchedPair>> {
        self.store.load_active().await
    }

    pub async fn excluded(&self) -> Result<Vec<MatchedPair>> {
        self.store.load_excluded().await
    }

    /// 將指定 case 從 active 移到 excluded；排除後 active 變空時回傳 `AllCasesExcluded`
    pub async fn exclude(&self, case_numbers: &[usize]) -> Result<ExclusionReport> {
        let active = self.store.load_active().await?;
        let (selected, invalid) = resolve_cases(&active, case_numbers);
        for case in &invalid {
            tracing::warn!("Case {} does not exist in the active list, skipping", case);
        }

        if selected.is_empty() {
            return Ok(ExclusionReport {
                excluded: Vec::new(),
                invalid,
                remaining: active.len(),
            });
        }

        let chosen: HashSet<usize> = selected.iter().map(|p| p.index).collect();
        let remaining: Vec<MatchedPair> = active
            .into_iter()
            .filter(|p| !chosen.contains(&p.index))
            .collect();

        let mut excluded = self.store.load_excluded().await?;
        excluded.extend(selected.iter().cloned());

        self.store.save_active(&remaining).await?;
        self.store.save_excluded(&excluded).await?;

        tracing::info!(
            "🚫 Excluded {} case(s), {} remaining",
            selected.len(),
            remaining.len()
        );

        if remaining.is_empty() {
            return Err(TwinshotError::AllCasesExcluded);
        }

        Ok(ExclusionReport {
            excluded: selected,
            invalid,
            remaining: remaining.len(),
        })
    }

    pub async fn revert_available(&self) -> bool {
        self.store.missing_files().await.is_empty()
    }

    /// 合併 excluded 回 active，依 original URL 穩定排序後刪除 excluded 檔案
    pub async fn revert(&self) -> Result<usize> {
        let missing = self.store.missing_files().await;
        if !missing.is_empty() {
            return Err(TwinshotError::RevertUnavailable { missing });
        }

        let mut merged = self.store.load_active().await?;
        let excluded = self.store.load_excluded().await?;
        let restored = excluded.len();
        merged.extend(excluded);
        merged.sort_by(|a, b| a.original_url.cmp(&b.original_url));

        self.store.save_active(&reindex(merged)).await?;
        self.store.clear_excluded().await?;

        tracing::info!("↩️ Reverted {} excluded case(s) back into the matching lists", restored);
        Ok(restored)
    }

    /// 移除重複的 URL：任一側的 URL 已出現過，整組 pair 就丟棄，兩份清單維持同步
    pub async fn deduplicate(&self) -> Result<usize> {
        let active = self.store.load_active().await?;
        let before = active.len();

        let mut seen_original = HashSet::new();
        let mut seen_staging = HashSet::new();
        let unique: Vec<MatchedPair> = active
            .into_iter()
            .filter(|p| {
                let fresh_original = !seen_original.contains(&p.original_url);
                let fresh_staging = !seen_staging.contains(&p.staging_url);
                if fresh_original && fresh_staging {
                    seen_original.insert(p.original_url.clone());
                    seen_staging.insert(p.staging_url.clone());
                    true
                } else {
                    false
                }
            })
            .collect();

        let removed = before - unique.len();
        if removed > 0 {
            self.store.save_active(&reindex(unique)).await?;
            tracing::info!("🧹 Removed {} duplicate case(s)", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::MockStorage;
    use serde_json::json;

    async fn seeded(original: serde_json::Value, staging: serde_json::Value) -> (CaseLedger<MockStorage>, MockStorage) {
        let storage = MockStorage::new();
        storage.put_json("matching_original_urls.json", original).await;
        storage.put_json("matching_staging_urls.json", staging).await;
        (CaseLedger::new(storage.clone(), StatePaths::default()), storage)
    }

    #[tokio::test]
    async fn test_exclude_then_revert_scenario() {
        let (ledger, storage) = seeded(json!(["u1", "u2", "u3"]), json!(["s1", "s2", "s3"])).await;

        let report = ledger.exclude(&[2]).await.unwrap();
        assert_eq!(report.remaining, 2);
        assert_eq!(report.excluded[0].original_url, "u2");

        assert_eq!(storage.get_json("matching_original_urls.json").await.unwrap(), json!(["u1", "u3"]));
        assert_eq!(storage.get_json("matching_staging_urls.json").await.unwrap(), json!(["s1", "s3"]));
        assert_eq!(storage.get_json("excluded_original_urls.json").await.unwrap(), json!(["u2"]));
        assert_eq!(storage.get_json("excluded_staging_urls.json").await.unwrap(), json!(["s2"]));

        assert!(ledger.revert_available().await);
        assert_eq!(ledger.revert().await.unwrap(), 1);

        assert_eq!(storage.get_json("matching_original_urls.json").await.unwrap(), json!(["u1", "u2", "u3"]));
        assert_eq!(storage.get_json("matching_staging_urls.json").await.unwrap(), json!(["s1", "s2", "s3"]));
        assert!(storage.get_file("excluded_original_urls.json").await.is_none());
        assert!(storage.get_file("excluded_staging_urls.json").await.is_none());
    }

    #[tokio::test]
    async fn test_excluding_everything_is_terminal() {
        let (ledger, storage) = seeded(json!(["u1", "u2"]), json!(["s1", "s2"])).await;

        let err = ledger.exclude(&[1, 2]).await.unwrap_err();
        assert!(matches!(err, TwinshotError::AllCasesExcluded));
        assert_eq!(storage.get_json("matching_original_urls.json").await.unwrap(), json!([]));
        assert_eq!(storage.get_json("excluded_staging_urls.json").await.unwrap(), json!(["s1", "s2"]));
    }

    #[tokio::test]
    async fn test_invalid_case_numbers_change_nothing() {
        let (ledger, storage) = seeded(json!(["u1"]), json!(["s1"])).await;

        let report = ledger.exclude(&[0, 5]).await.unwrap();
        assert!(report.excluded.is_empty());
        assert_eq!(report.invalid, vec![0, 5]);
        assert!(storage.get_file("excluded_original_urls.json").await.is_none());
        assert!(!ledger.revert_available().await);
    }

    #[tokio::test]
    async fn test_second_exclusion_appends_to_ledger() {
        let (ledger, _storage) = seeded(json!(["u1", "u2", "u3", "u4"]), json!(["s1", "s2", "s3", "s4"])).await;

        ledger.exclude(&[1]).await.unwrap();
        // 剩下 u2,u3,u4，case 2 現在是 u3
        ledger.exclude(&[2]).await.unwrap();

        let excluded = ledger.excluded().await.unwrap();
        let urls: Vec<&str> = excluded.iter().map(|p| p.original_url.as_str()).collect();
        assert_eq!(urls, vec!["u1", "u3"]);
        assert_eq!(excluded[1].staging_url, "s3");

        let active = ledger.active().await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[1].index, 2);
        assert_eq!(active[1].staging_url, "s4");
    }

    #[tokio::test]
    async fn test_revert_requires_ledger_files() {
        let (ledger, _storage) = seeded(json!(["u1"]), json!(["s1"])).await;

        match ledger.revert().await {
            Err(TwinshotError::RevertUnavailable { missing }) => {
                assert_eq!(missing, vec!["excluded_original_urls.json", "excluded_staging_urls.json"]);
            }
            other => panic!("expected RevertUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_revert_keeps_lists_in_lockstep() {
        let (ledger, _storage) = seeded(
            json!(["https://a.com/z", "https://a.com/b", "https://a.com/m"]),
            json!(["https://s.com/zz", "https://s.com/bb", "https://s.com/mm"]),
        )
        .await;

        ledger.exclude(&[3]).await.unwrap();
        ledger.revert().await.unwrap();

        let active = ledger.active().await.unwrap();
        let originals: Vec<&str> = active.iter().map(|p| p.original_url.as_str()).collect();
        assert_eq!(originals, vec!["https://a.com/b", "https://a.com/m", "https://a.com/z"]);
        for pair in &active {
            let tail = pair.original_url.rsplit('/').next().unwrap();
            assert_eq!(pair.staging_url, format!("https://s.com/{}{}", tail, tail));
        }
    }

    #[tokio::test]
    async fn test_deduplicate_after_revert() {
        let (ledger, storage) = seeded(json!(["u1", "u2", "u1", "u3"]), json!(["s1", "s2", "s1", "s3"])).await;

        assert_eq!(ledger.deduplicate().await.unwrap(), 1);
        assert_eq!(storage.get_json("matching_original_urls.json").await.unwrap(), json!(["u1", "u2", "u3"]));
        assert_eq!(storage.get_json("matching_staging_urls.json").await.unwrap(), json!(["s1", "s2", "s3"]));
        assert_eq!(ledger.deduplicate().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_lists_are_rejected() {
        let (ledger, _storage) = seeded(json!(["u1", "u2"]), json!(["s1"])).await;
        assert!(matches!(
            ledger.active().await,
            Err(TwinshotError::LedgerMismatchError { .. })
        ));
    }

    #[test]
    fn test_resolve_cases() {
        let active = reindex(vec![
            MatchedPair::new(0, "u1", "s1"),
            MatchedPair::new(0, "u2", "s2"),
        ]);
        let (selected, invalid) = resolve_cases(&active, &[2, 2, 3]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].index, 2);
        assert_eq!(invalid, vec![3]);
    }
}
