//! 倒计时控制：后台线程每秒递减共享剩余值，到点回调完成
//!
//! UI 线程只读 [`RemainingCell`]，后台线程是唯一写者。取消是协作式的：
//! toggle 发一条取消消息，循环在下一次 `recv_timeout` 处观察到就退出，
//! 不播放完成回调。

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// 完成回调（提示音、落库等），在后台线程上调用，带本次倒计时的时长
pub type CompletionFn = Arc<dyn Fn(Duration) + Send + Sync>;

/// 共享剩余秒数。单写者规则：仅后台倒计时线程写，UI 线程读。
/// 值是展示用途，与真正的截止时刻之间允许短暂偏差。
#[derive(Default)]
pub struct RemainingCell(AtomicI64);

impl RemainingCell {
    fn store(&self, secs: i64) {
        self.0.store(secs, Ordering::Relaxed);
    }

    fn decrement(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn secs(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

struct Active {
    cancel_tx: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// 倒计时控制器。任意时刻至多一个在跑的倒计时线程。
pub struct Countdown {
    remaining: Arc<RemainingCell>,
    on_complete: CompletionFn,
    active: Option<Active>,
}

impl Countdown {
    pub fn new(on_complete: CompletionFn) -> Self {
        Self {
            remaining: Arc::new(RemainingCell::default()),
            on_complete,
            active: None,
        }
    }

    /// 展示用剩余秒数，负值截断为 0
    pub fn remaining_secs(&self) -> i64 {
        self.remaining.secs().max(0)
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.handle.is_finished())
    }

    /// 空闲时开始一个 `duration` 的倒计时；运行中则取消当前的。
    /// 取消会等后台线程退出，保证「至多一个循环」的不变量。
    pub fn toggle(&mut self, duration: Duration) {
        if let Some(active) = self.active.take() {
            if !active.handle.is_finished() {
                let _ = active.cancel_tx.send(());
                let _ = active.handle.join();
                return;
            }
            // 自然跑完的线程只剩回收，继续开新的
            let _ = active.handle.join();
        }
        self.start(duration);
    }

    fn start(&mut self, duration: Duration) {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let remaining = Arc::clone(&self.remaining);
        let on_complete = Arc::clone(&self.on_complete);
        remaining.store(duration.as_secs() as i64);

        let handle = thread::spawn(move || {
            let deadline = Instant::now() + duration;
            loop {
                let now = Instant::now();
                if now >= deadline {
                    remaining.store(0);
                    on_complete(duration);
                    return;
                }
                // tick 与取消信号二选一，先到先处理
                let tick = Duration::from_secs(1).min(deadline - now);
                match cancel_rx.recv_timeout(tick) {
                    Err(mpsc::RecvTimeoutError::Timeout) => remaining.decrement(),
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                        // 取消：清零退出，不触发完成回调
                        remaining.store(0);
                        return;
                    }
                }
            }
        });
        self.active = Some(Active { cancel_tx, handle });
    }
}

/// 剩余时间格式化为 "MM:SS"
pub fn format_remaining(secs: i64) -> String {
    let s = secs.max(0);
    format!("{:02}:{:02}", s / 60, s % 60)
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseDurationError {
    #[error("empty duration")]
    Empty,
    #[error("missing unit (try 15m or 90s)")]
    MissingUnit,
    #[error("unknown unit {0:?}")]
    UnknownUnit(String),
    #[error("bad number {0:?}")]
    InvalidNumber(String),
}

/// 解析 "15m"、"1h30m"、"90s"、"1.5h" 这类时长文本
pub fn parse_duration(text: &str) -> Result<Duration, ParseDurationError> {
    let mut rest = text.trim();
    if rest.is_empty() {
        return Err(ParseDurationError::Empty);
    }
    let mut total_secs = 0.0f64;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(ParseDurationError::InvalidNumber(rest.to_string()));
        }
        let (number, tail) = rest.split_at(digits);
        let value: f64 = number
            .parse()
            .map_err(|_| ParseDurationError::InvalidNumber(number.to_string()))?;
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        if unit_len == 0 {
            return Err(ParseDurationError::MissingUnit);
        }
        let (unit, next) = tail.split_at(unit_len);
        let factor = match unit {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 0.001,
            other => return Err(ParseDurationError::UnknownUnit(other.to_string())),
        };
        total_secs += value * factor;
        rest = next;
    }
    // 总秒数超出 Duration 能表示的范围时按坏数字处理
    Duration::try_from_secs_f64(total_secs)
        .map_err(|_| ParseDurationError::InvalidNumber(text.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_countdown() -> (Countdown, Arc<AtomicUsize>) {
        let completions = Arc::new(AtomicUsize::new(0));
        let completions_cb = Arc::clone(&completions);
        let countdown = Countdown::new(Arc::new(move |_| {
            completions_cb.fetch_add(1, Ordering::SeqCst);
        }));
        (countdown, completions)
    }

    #[test]
    fn cancel_before_any_tick_skips_completion() {
        let (mut countdown, completions) = counting_countdown();
        countdown.toggle(Duration::from_secs(30));
        assert!(countdown.is_running());
        countdown.toggle(Duration::from_secs(30));
        assert!(!countdown.is_running());
        assert_eq!(countdown.remaining_secs(), 0);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn run_to_completion_fires_callback_exactly_once() {
        let (mut countdown, completions) = counting_countdown();
        countdown.toggle(Duration::from_millis(50));
        thread::sleep(Duration::from_millis(400));
        assert!(!countdown.is_running());
        assert_eq!(countdown.remaining_secs(), 0);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn toggle_after_completion_starts_fresh() {
        let (mut countdown, completions) = counting_countdown();
        countdown.toggle(Duration::from_millis(50));
        thread::sleep(Duration::from_millis(400));
        countdown.toggle(Duration::from_secs(30));
        assert!(countdown.is_running());
        assert_eq!(countdown.remaining_secs(), 30);
        countdown.toggle(Duration::from_secs(30));
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn completion_fires_for_each_run_across_restart() {
        let (mut countdown, completions) = counting_countdown();
        countdown.toggle(Duration::from_millis(50));
        thread::sleep(Duration::from_millis(300));
        // 回收已跑完的线程并立刻开下一轮
        countdown.toggle(Duration::from_millis(50));
        thread::sleep(Duration::from_millis(300));
        assert!(!countdown.is_running());
        assert_eq!(completions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn remaining_starts_at_full_duration() {
        let (mut countdown, _) = counting_countdown();
        countdown.toggle(Duration::from_secs(900));
        assert_eq!(countdown.remaining_secs(), 900);
        countdown.toggle(Duration::from_secs(900));
    }

    #[test]
    fn format_remaining_clamps_and_pads() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(-3), "00:00");
        assert_eq!(format_remaining(59), "00:59");
        assert_eq!(format_remaining(900), "15:00");
        assert_eq!(format_remaining(3601), "60:01");
    }

    #[test]
    fn parse_simple_durations() {
        assert_eq!(parse_duration("15m"), Ok(Duration::from_secs(900)));
        assert_eq!(parse_duration("90s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert_eq!(parse_duration(""), Err(ParseDurationError::Empty));
        assert_eq!(parse_duration("15"), Err(ParseDurationError::MissingUnit));
        assert_eq!(
            parse_duration("15x"),
            Err(ParseDurationError::UnknownUnit("x".into()))
        );
        assert_eq!(
            parse_duration("m"),
            Err(ParseDurationError::InvalidNumber("m".into()))
        );
        assert_eq!(
            parse_duration("1..5h"),
            Err(ParseDurationError::InvalidNumber("1..5".into()))
        );
    }

    #[test]
    fn parse_rejects_overflowing_duration() {
        assert_eq!(
            parse_duration("99999999999999999999h"),
            Err(ParseDurationError::InvalidNumber(
                "99999999999999999999h".into()
            ))
        );
    }
}
