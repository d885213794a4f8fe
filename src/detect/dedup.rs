use super::region::WidgetRegion;

/// Greedy overlap suppression.
///
/// Candidates are visited from highest to lowest confidence (ties keep their
/// input order). A candidate is kept only if its IoU with every region kept so
/// far is below `overlap_threshold`. The survivors are returned largest first,
/// truncated to `max_regions`.
pub fn deduplicate(
    mut candidates: Vec<WidgetRegion>,
    overlap_threshold: f32,
    max_regions: usize,
) -> Vec<WidgetRegion> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<WidgetRegion> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| candidate.iou(k) < overlap_threshold) {
            kept.push(candidate);
        }
    }

    kept.sort_by(|a, b| b.area.cmp(&a.area));
    kept.truncate(max_regions);
    kept
}
