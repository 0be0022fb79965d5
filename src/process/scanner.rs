use crate::config::HarnessConfig;

/// Watches a subject's stdout for conflict prompts and yields the keystrokes
/// to answer them with.
///
/// Output arrives in arbitrary chunks, so the tail of each chunk is carried
/// over; a signal split across two reads is still seen exactly once.
#[derive(Debug, Clone)]
pub struct PromptScanner {
    prompts: Vec<(String, String)>,
    pending: String,
    carry: usize,
}

impl PromptScanner {
    pub fn new(cfg: &HarnessConfig) -> Self {
        let prompts = vec![
            (
                cfg.normal_conflict_signal.clone(),
                keystrokes(&cfg.normal_conflict_response),
            ),
            (
                cfg.deleted_conflict_signal.clone(),
                keystrokes(&cfg.deleted_conflict_response),
            ),
        ];
        let carry = prompts
            .iter()
            .map(|(signal, _)| signal.len())
            .max()
            .unwrap_or(0)
            .saturating_sub(1);
        Self {
            prompts,
            pending: String::new(),
            carry,
        }
    }

    /// Feeds one chunk of stdout; returns the responses to write, in order.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);
        let mut responses = Vec::new();

        while let Some((end, response)) = self.earliest_match() {
            responses.push(response);
            self.pending.drain(..end);
        }

        if self.pending.len() > self.carry {
            let mut cut = self.pending.len() - self.carry;
            while !self.pending.is_char_boundary(cut) {
                cut += 1;
            }
            self.pending.drain(..cut);
        }
        responses
    }

    fn earliest_match(&self) -> Option<(usize, String)> {
        self.prompts
            .iter()
            .filter(|(signal, _)| !signal.is_empty())
            .filter_map(|(signal, response)| {
                self.pending
                    .find(signal.as_str())
                    .map(|start| (start, start + signal.len(), response))
            })
            .min_by_key(|(start, _, _)| *start)
            .map(|(_, end, response)| (end, response.clone()))
    }
}

fn keystrokes(lines: &[String]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}
