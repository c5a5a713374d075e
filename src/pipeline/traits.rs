//! Core pipeline traits.
//!
//! - [`Node`] - An offline processing step that transforms a whole buffer
//! - [`Chain`] - Two nodes run back to back, built with [`NodeExt::connect`]

/// A processing node that transforms input to output.
///
/// Nodes are the building blocks of the processing pipeline. Each call works on
/// a complete buffer and always produces output; nodes keep no state between
/// calls, so running one twice on the same input gives the same result.
pub trait Node: Send + Sync {
    type Input;
    type Output;

    fn process(&self, input: Self::Input) -> Self::Output;
}

/// Two nodes where the output of `first` feeds `second`.
///
/// Like a linked list, a chain can itself be connected to further nodes.
pub struct Chain<First, Second> {
    pub first: First,
    pub second: Second,
}

impl<First, Second> Node for Chain<First, Second>
where
    First: Node,
    Second: Node<Input = First::Output>,
{
    type Input = First::Input;
    type Output = Second::Output;

    fn process(&self, input: Self::Input) -> Self::Output {
        self.second.process(self.first.process(input))
    }
}

pub trait NodeExt: Node + Sized {
    fn connect<Next>(self, next: Next) -> Chain<Self, Next>
    where
        Next: Node<Input = Self::Output>,
    {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<N: Node> NodeExt for N {}
