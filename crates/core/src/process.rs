use crate::{Error, Message, Operation};

/// An ordered sequence of operations, each fed with the output of the
/// previous one.
///
/// Execution stops at the first failing step and its error is returned
/// unchanged.
#[derive(Clone, Debug, Default)]
pub struct Process {
    steps: Vec<Operation>,
}

impl Process {
    /// Creates an empty process, which returns its input unchanged.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    #[inline]
    pub fn then(mut self, step: Operation) -> Self {
        self.steps.push(step);
        self
    }

    /// Returns the number of steps.
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the process has no steps.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs all steps in order.
    pub async fn execute(&self, msg: Message) -> Result<Message, Error> {
        let mut msg = msg;
        for (idx, step) in self.steps.iter().enumerate() {
            trace!("running step {idx} ({})", step.name());
            msg = step.execute(msg).await?;
        }
        Ok(msg)
    }

    /// Wraps the process into a single operation, so it can be nested in
    /// other processes.
    pub fn into_operation(self) -> Operation {
        Operation::new(move |msg, _| {
            let process = self.clone();
            async move { process.execute(msg).await }
        })
        .named("process")
    }
}

impl From<Operation> for Process {
    #[inline]
    fn from(step: Operation) -> Self {
        Self { steps: vec![step] }
    }
}

impl FromIterator<Operation> for Process {
    fn from_iter<T: IntoIterator<Item = Operation>>(iter: T) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}
