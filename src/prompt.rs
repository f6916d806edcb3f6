use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};

use crate::error::PromptError;

/// Asks one question and reads one line back.
pub struct LinePrompt<R, W> {
    reader: R,
    writer: W,
}

impl LinePrompt<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LinePrompt<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Write `question` and return the raw answer line, newline included.
    pub async fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        self.writer.write_all(question.as_bytes()).await?;
        self.writer.flush().await?;

        let mut answer = String::new();
        if self.reader.read_line(&mut answer).await? == 0 {
            return Err(PromptError::Closed);
        }
        Ok(answer)
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_one_line() {
        let input: &[u8] = b"merged.pdf\nsecond\n";
        let mut prompt = LinePrompt::new(input, Vec::new());

        let answer = prompt.ask("name? ").await.unwrap();
        assert_eq!(answer, "merged.pdf\n");

        let (_, written) = prompt.into_parts();
        assert_eq!(written, b"name? ");
    }

    #[tokio::test]
    async fn test_empty_line_is_an_answer() {
        let input: &[u8] = b"\n";
        let mut prompt = LinePrompt::new(input, Vec::new());
        assert_eq!(prompt.ask("name? ").await.unwrap(), "\n");
    }

    #[tokio::test]
    async fn test_closed_input_is_an_error() {
        let input: &[u8] = b"";
        let mut prompt = LinePrompt::new(input, Vec::new());
        assert!(matches!(
            prompt.ask("name? ").await,
            Err(PromptError::Closed)
        ));
    }
}
