use super::filter::{filter_by_moneyness, Moneyness};
use super::window::select_window;
use crate::chain::types::OptionRecord;

/// Derived view over the chain snapshot, owned by the engine task.
///
/// The one rule that matters here: a moneyness change refilters the *cached*
/// window, while a snapshot or window-size change recomputes the window and
/// then refilters. Toggling the filter therefore never changes which strikes
/// are window candidates, only which of them are visible.
#[derive(Debug)]
pub struct ChainView {
    threshold: f64,
    window_size: usize,
    moneyness: Moneyness,
    snapshot: Vec<OptionRecord>,
    windowed: Vec<OptionRecord>,
    visible: Vec<OptionRecord>,
    max_return_over_risk: Option<f64>,
}

impl ChainView {
    pub fn new(threshold: f64, window_size: usize) -> Self {
        Self {
            threshold,
            window_size,
            moneyness: Moneyness::All,
            snapshot: Vec::new(),
            windowed: Vec::new(),
            visible: Vec::new(),
            max_return_over_risk: None,
        }
    }

    /// Replace the full snapshot wholesale and rederive the view.
    pub fn on_snapshot(&mut self, records: Vec<OptionRecord>) {
        self.max_return_over_risk = records
            .iter()
            .map(|r| r.percent_return_1_sigma_max_risk)
            .fold(None, |acc, v| match acc {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            });
        self.snapshot = records;
        self.rewindow();
    }

    pub fn on_window_size_changed(&mut self, window_size: usize) {
        self.window_size = window_size;
        self.rewindow();
    }

    /// Filter change only: reapply to the cached window, never reselect.
    pub fn on_moneyness_changed(&mut self, moneyness: Moneyness) {
        self.moneyness = moneyness;
        self.visible = filter_by_moneyness(&self.windowed, self.moneyness);
    }

    fn rewindow(&mut self) {
        self.windowed = select_window(&self.snapshot, self.threshold, self.window_size);
        self.visible = filter_by_moneyness(&self.windowed, self.moneyness);
    }

    pub fn visible(&self) -> &[OptionRecord] {
        &self.visible
    }

    pub fn windowed(&self) -> &[OptionRecord] {
        &self.windowed
    }

    pub fn snapshot_len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn moneyness(&self) -> Moneyness {
        self.moneyness
    }

    pub fn max_return_over_risk(&self) -> Option<f64> {
        self.max_return_over_risk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(strike: f64, pct: f64) -> OptionRecord {
        OptionRecord {
            strike,
            percent_in_out_money: pct,
            ..OptionRecord::default()
        }
    }

    fn snapshot() -> Vec<OptionRecord> {
        vec![
            rec(200.0, 6.7),
            rec(205.0, 4.3),
            rec(210.0, 2.0),
            rec(214.29, 0.0),
            rec(220.0, -2.6),
            rec(225.0, -4.8),
            rec(230.0, -6.8),
        ]
    }

    fn strikes(rows: &[OptionRecord]) -> Vec<f64> {
        rows.iter().map(|r| r.strike).collect()
    }

    #[test]
    fn test_empty_until_first_snapshot() {
        let view = ChainView::new(214.29, 10);
        assert!(view.visible().is_empty());
        assert!(view.windowed().is_empty());
        assert_eq!(view.moneyness(), Moneyness::All);
    }

    #[test]
    fn test_snapshot_derives_window_and_visible() {
        let mut view = ChainView::new(214.29, 4);
        view.on_snapshot(snapshot());
        assert_eq!(strikes(view.windowed()), vec![210.0, 214.29, 220.0, 225.0]);
        assert_eq!(view.visible(), view.windowed());
        assert_eq!(view.snapshot_len(), 7);
    }

    #[test]
    fn test_filter_change_uses_cached_window() {
        let mut view = ChainView::new(214.29, 4);
        view.on_snapshot(snapshot());
        let windowed_before = view.windowed().to_vec();

        view.on_moneyness_changed(Moneyness::Out);
        assert_eq!(view.windowed(), windowed_before.as_slice());
        assert_eq!(strikes(view.visible()), vec![220.0, 225.0]);

        // second toggle still leaves the candidate window untouched
        view.on_moneyness_changed(Moneyness::In);
        assert_eq!(view.windowed(), windowed_before.as_slice());
        assert_eq!(strikes(view.visible()), vec![210.0, 214.29]);
    }

    #[test]
    fn test_filter_back_to_all_restores_window() {
        let mut view = ChainView::new(214.29, 4);
        view.on_snapshot(snapshot());
        view.on_moneyness_changed(Moneyness::In);
        view.on_moneyness_changed(Moneyness::All);
        assert_eq!(view.visible(), view.windowed());
    }

    #[test]
    fn test_window_change_recomputes_then_refilters() {
        let mut view = ChainView::new(214.29, 4);
        view.on_snapshot(snapshot());
        view.on_moneyness_changed(Moneyness::Out);

        view.on_window_size_changed(6);
        assert_eq!(
            strikes(view.windowed()),
            vec![205.0, 210.0, 214.29, 220.0, 225.0, 230.0]
        );
        // active filter is reapplied to the new window
        assert_eq!(strikes(view.visible()), vec![220.0, 225.0, 230.0]);
    }

    #[test]
    fn test_snapshot_replacement_recomputes_under_active_filter() {
        let mut view = ChainView::new(214.29, 4);
        view.on_snapshot(snapshot());
        view.on_moneyness_changed(Moneyness::In);

        view.on_snapshot(vec![rec(214.29, 0.0), rec(220.0, -2.6), rec(225.0, -4.8)]);
        assert_eq!(strikes(view.windowed()), vec![214.29, 220.0, 225.0]);
        assert_eq!(strikes(view.visible()), vec![214.29]);
    }

    #[test]
    fn test_zero_window_empties_visible() {
        let mut view = ChainView::new(214.29, 4);
        view.on_snapshot(snapshot());
        view.on_window_size_changed(0);
        assert!(view.windowed().is_empty());
        assert!(view.visible().is_empty());
    }

    #[test]
    fn test_max_return_tracks_full_snapshot_not_window() {
        let mut view = ChainView::new(214.29, 2);
        let mut rows = snapshot();
        // the max lives outside the 2-row window
        rows[0].percent_return_1_sigma_max_risk = 184.8;
        view.on_snapshot(rows);
        assert_eq!(view.max_return_over_risk(), Some(184.8));

        view.on_window_size_changed(4);
        assert_eq!(view.max_return_over_risk(), Some(184.8));
    }
}
