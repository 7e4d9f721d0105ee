//! Legal instrument classification wizard.
//!
//! A fixed decision tree of yes/no questions that maps an answer sequence to
//! one of the eight [`InstrumentType`]s. The graph is a lookup table keyed by
//! `(node, answer)`; a traversal is the ordered answer history plus the
//! current node, so clients can persist it and resume by replaying.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::legal_instrument::InstrumentType;

/// Every node of the classification graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    // Questions
    ConfidentialityOnly,
    ResearchActivities,
    PartnerFunding,
    FoundationManaged,
    PaidService,
    TechnologyRights,
    ExclusiveTransfer,
    // Outcomes
    Nda,
    TechnicalCooperation,
    PdiPartnership,
    PdiFoundation,
    Service,
    Memorandum,
    Licensing,
    TechnologyTransfer,
}

/// A yes/no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
}

/// Static description of one node.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Question {
        id: NodeId,
        prompt: &'static str,
        yes: NodeId,
        no: NodeId,
    },
    Outcome {
        id: NodeId,
        instrument: InstrumentType,
    },
}

/// Entry point of every traversal.
pub const START: NodeId = NodeId::ConfidentialityOnly;

/// The full graph, questions first.
pub static GRAPH: [Node; 15] = [
    Node::Question {
        id: NodeId::ConfidentialityOnly,
        prompt: "Is the sole purpose to exchange confidential information before a partnership is formalized?",
        yes: NodeId::Nda,
        no: NodeId::ResearchActivities,
    },
    Node::Question {
        id: NodeId::ResearchActivities,
        prompt: "Does the project involve research, development and innovation (PD&I) activities carried out jointly with the partner?",
        yes: NodeId::PartnerFunding,
        no: NodeId::PaidService,
    },
    Node::Question {
        id: NodeId::PartnerFunding,
        prompt: "Will the partner contribute financial resources to the project?",
        yes: NodeId::FoundationManaged,
        no: NodeId::TechnicalCooperation,
    },
    Node::Question {
        id: NodeId::FoundationManaged,
        prompt: "Will the financial resources be managed by a support foundation?",
        yes: NodeId::PdiFoundation,
        no: NodeId::PdiPartnership,
    },
    Node::Question {
        id: NodeId::PaidService,
        prompt: "Will the university provide a paid technical service to the partner?",
        yes: NodeId::Service,
        no: NodeId::TechnologyRights,
    },
    Node::Question {
        id: NodeId::TechnologyRights,
        prompt: "Does the project grant rights over university-owned technology or intellectual property?",
        yes: NodeId::ExclusiveTransfer,
        no: NodeId::Memorandum,
    },
    Node::Question {
        id: NodeId::ExclusiveTransfer,
        prompt: "Will ownership of the technology be transferred to the partner?",
        yes: NodeId::TechnologyTransfer,
        no: NodeId::Licensing,
    },
    Node::Outcome {
        id: NodeId::Nda,
        instrument: InstrumentType::Nda,
    },
    Node::Outcome {
        id: NodeId::TechnicalCooperation,
        instrument: InstrumentType::TechnicalCooperationAgreement,
    },
    Node::Outcome {
        id: NodeId::PdiPartnership,
        instrument: InstrumentType::PdiPartnershipAgreement,
    },
    Node::Outcome {
        id: NodeId::PdiFoundation,
        instrument: InstrumentType::PdiFoundationAgreement,
    },
    Node::Outcome {
        id: NodeId::Service,
        instrument: InstrumentType::ServiceContract,
    },
    Node::Outcome {
        id: NodeId::Memorandum,
        instrument: InstrumentType::MemorandumOfUnderstanding,
    },
    Node::Outcome {
        id: NodeId::Licensing,
        instrument: InstrumentType::LicensingContract,
    },
    Node::Outcome {
        id: NodeId::TechnologyTransfer,
        instrument: InstrumentType::TechnologyTransferContract,
    },
];

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Question { id, .. } | Node::Outcome { id, .. } => *id,
        }
    }
}

impl NodeId {
    /// Look up the static node description. `GRAPH` is laid out in
    /// declaration order, so the discriminant is the index.
    pub fn node(self) -> &'static Node {
        &GRAPH[self as usize]
    }

    /// The instrument reached at this node, if it is an outcome.
    pub fn outcome(self) -> Option<InstrumentType> {
        match self.node() {
            Node::Outcome { instrument, .. } => Some(*instrument),
            Node::Question { .. } => None,
        }
    }
}

/// Successor of `node` for `answer`. Errors when `node` is an outcome.
pub fn next(node: NodeId, answer: Answer) -> Result<NodeId, CoreError> {
    match node.node() {
        Node::Question { yes, no, .. } => Ok(match answer {
            Answer::Yes => *yes,
            Answer::No => *no,
        }),
        Node::Outcome { .. } => Err(CoreError::Validation(
            "Classification already reached an outcome; reset to start over".to_string(),
        )),
    }
}

/// One answered question in a traversal history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub question: NodeId,
    pub answer: Answer,
}

/// A traversal of the classification graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traversal {
    pub current: NodeId,
    pub history: Vec<Step>,
}

impl Default for Traversal {
    fn default() -> Self {
        Self {
            current: START,
            history: Vec::new(),
        }
    }
}

impl Traversal {
    /// Start a fresh traversal at [`START`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the current question and advance.
    pub fn answer(&mut self, answer: Answer) -> Result<NodeId, CoreError> {
        let next = next(self.current, answer)?;
        self.history.push(Step {
            question: self.current,
            answer,
        });
        self.current = next;
        Ok(next)
    }

    /// Discard all answers and return to [`START`].
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The outcome reached, if any.
    pub fn outcome(&self) -> Option<InstrumentType> {
        self.current.outcome()
    }

    /// Rebuild a traversal from a recorded answer sequence.
    pub fn replay(answers: &[Answer]) -> Result<Self, CoreError> {
        let mut traversal = Self::new();
        for answer in answers {
            traversal.answer(*answer)?;
        }
        Ok(traversal)
    }

    /// Rebuild a traversal from a recorded history, checking that every step's
    /// question is the node the graph actually reaches at that point.
    pub fn replay_history(history: &[Step]) -> Result<Self, CoreError> {
        let mut traversal = Self::new();
        for (i, step) in history.iter().enumerate() {
            if step.question != traversal.current {
                return Err(CoreError::Validation(format!(
                    "Step {} answers {:?} but the classification is at {:?}",
                    i + 1,
                    step.question,
                    traversal.current
                )));
            }
            traversal.answer(step.answer)?;
        }
        Ok(traversal)
    }
}
