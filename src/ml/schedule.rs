// ============================================================
// Layer 5 - Learning-Rate Schedule
// ============================================================
// Linear warmup followed by linear decay to zero, counted in
// optimizer steps (one step per gradient-accumulation window):
//
//   lr(t) = base * t / warmup                    t <  warmup
//   lr(t) = base * (total - t) / (total - warmup) t >= warmup

#[derive(Debug, Clone, Copy)]
pub struct LinearWarmup {
    base_lr:      f64,
    total_steps:  usize,
    warmup_steps: usize,
}

impl LinearWarmup {
    pub fn new(base_lr: f64, total_steps: usize, warmup_proportion: f64) -> Self {
        let warmup_steps = (total_steps as f64 * warmup_proportion.clamp(0.0, 1.0)) as usize;
        Self { base_lr, total_steps, warmup_steps }
    }

    pub fn warmup_steps(&self) -> usize {
        self.warmup_steps
    }

    pub fn lr_at(&self, step: usize) -> f64 {
        let factor = if step < self.warmup_steps {
            step as f64 / self.warmup_steps.max(1) as f64
        } else {
            let left = self.total_steps.saturating_sub(step) as f64;
            left / self.total_steps.saturating_sub(self.warmup_steps).max(1) as f64
        };
        self.base_lr * factor.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_then_decay() {
        let s = LinearWarmup::new(1.0, 100, 0.1);
        assert_eq!(s.warmup_steps(), 10);
        assert_eq!(s.lr_at(0), 0.0);
        assert!((s.lr_at(5) - 0.5).abs() < 1e-12);
        assert!((s.lr_at(10) - 1.0).abs() < 1e-12);
        assert!((s.lr_at(55) - 0.5).abs() < 1e-12);
        assert_eq!(s.lr_at(100), 0.0);
    }

    #[test]
    fn test_never_negative_past_the_end() {
        let s = LinearWarmup::new(2e-5, 10, 0.1);
        assert_eq!(s.lr_at(25), 0.0);
    }

    #[test]
    fn test_no_warmup() {
        let s = LinearWarmup::new(1.0, 4, 0.0);
        assert_eq!(s.lr_at(0), 1.0);
        assert!((s.lr_at(2) - 0.5).abs() < 1e-12);
    }
}
