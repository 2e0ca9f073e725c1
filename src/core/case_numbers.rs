/// 解析操作員輸入的 case 編號，例如 "1,2,3" 或 "1-4,6"。
///
/// 結果保留輸入順序並去除重複；無法解析的片段與 0 會被忽略，
/// 反向範圍（如 "5-2"）不產生任何編號。
pub fn parse_case_numbers(input: &str) -> Vec<usize> {
    let mut numbers: Vec<usize> = Vec::new();
    let mut push = |n: usize| {
        if n > 0 && !numbers.contains(&n) {
            numbers.push(n);
        }
    };

    for segment in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some((start, end)) = segment.split_once('-') {
            match (start.trim().parse::<usize>(), end.trim().parse::<usize>()) {
                (Ok(start), Ok(end)) => (start..=end).for_each(&mut push),
                _ => tracing::debug!("Ignoring malformed case range '{}'", segment),
            }
        } else {
            match segment.parse::<usize>() {
                Ok(n) => push(n),
                Err(_) => tracing::debug!("Ignoring malformed case number '{}'", segment),
            }
        }
    }

    numbers
}
