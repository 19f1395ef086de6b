//! 重写确认
//!
//! 交互式 `[y/N]` 提示，以及 `--yes` / `--no-rewrite` 对应的固定答复。

use crate::processing::{Confirm, RewriteAction};
use std::io::{self, BufRead, Write};

/// 从标准输入读取确认；EOF 或无法识别的回答视为“否”
pub struct StdinConfirm<R> {
    input: R,
}

impl StdinConfirm<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> StdinConfirm<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> Confirm for StdinConfirm<R> {
    fn confirm(&mut self, action: RewriteAction, count: usize) -> bool {
        print!(
            "❓ 是否对 {count} 个文件执行「{}」？此操作会原地覆盖文件 / Rewrite {count} file(s) in place? [y/N] ",
            action.describe()
        );
        io::stdout().flush().ok();

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => {
                println!();
                false
            }
            Ok(_) => is_yes(&answer),
        }
    }
}

/// 固定答复（`--yes` 为 true，`--no-rewrite` 为 false）
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, action: RewriteAction, count: usize) -> bool {
        if self.0 {
            println!("✅ 自动确认 / auto-confirmed: {} ({count})", action.describe());
        }
        self.0
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_stdin_answers() {
        let mut yes = StdinConfirm::new(Cursor::new("Y\n"));
        assert!(yes.confirm(RewriteAction::Trim, 1));

        let mut no = StdinConfirm::new(Cursor::new("nope\n"));
        assert!(!no.confirm(RewriteAction::Trim, 1));

        let mut eof = StdinConfirm::new(Cursor::new(""));
        assert!(!eof.confirm(RewriteAction::Downmix, 3));
    }

    #[test]
    fn test_auto_confirm() {
        assert!(AutoConfirm(true).confirm(RewriteAction::Trim, 2));
        assert!(!AutoConfirm(false).confirm(RewriteAction::Trim, 2));
    }
}
