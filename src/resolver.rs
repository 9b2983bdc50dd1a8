//! Response resolution.
//!
//! Picks a strategy for a classified request: the deterministic math
//! solver when it can answer, otherwise a category-specific prompt for the
//! generation backend.

use tracing::{debug, info, warn};

use crate::backend::GenerationBackend;
use crate::classifier::{classify, Category, Vitals};
use crate::generation::Generator;
use crate::math;
use crate::transport::InboundRequest;

pub struct Resolver<B> {
    generator: Generator<B>,
}

impl<B: GenerationBackend> Resolver<B> {
    pub const fn new(generator: Generator<B>) -> Self {
        Self { generator }
    }

    /// Resolve a decoded request. Structured vitals skip classification.
    pub async fn respond(&self, request: &InboundRequest) -> String {
        match request {
            InboundRequest::Text { message } => {
                let category = classify(message);
                info!(?category, "Classified message");
                self.resolve(category, message).await
            }
            InboundRequest::Vitals(vitals) => {
                info!(
                    systolic = vitals.systolic,
                    diastolic = vitals.diastolic,
                    heart_rate = vitals.heart_rate,
                    "Structured vitals received"
                );
                self.generator
                    .generate(&structured_vitals_prompt(vitals))
                    .await
            }
        }
    }

    /// Resolve `message` under an already-assigned category.
    pub async fn resolve(&self, category: Category, message: &str) -> String {
        let prompt = match category {
            Category::Math => match math::try_solve(message) {
                Ok(Some(solution)) => {
                    debug!(%solution, "Solved deterministically");
                    return solution;
                }
                Ok(None) => math_prompt(message),
                Err(e) => {
                    warn!(error = %e, "Math fast path failed, delegating");
                    math_prompt(message)
                }
            },
            Category::Vitals(vitals) => vitals_prompt(&vitals),
            Category::General => general_prompt(message),
        };

        self.generator.generate(&prompt).await
    }
}

pub fn math_prompt(problem: &str) -> String {
    format!(
        "Please solve this math problem with clear step-by-step explanation:\n\
         Problem: {problem}\n\n\
         Provide the solution in this format:\n\
         1. First, explain what the problem is asking\n\
         2. Show each step clearly with explanations\n\
         3. Provide the final answer with proper units if applicable\n\
         4. Keep it educational and easy to understand"
    )
}

pub fn vitals_prompt(vitals: &Vitals) -> String {
    format!(
        "Act as a cheerful, concise medical advisor. \
         Given BP: {}/{} mmHg, Heart Rate: {} bpm. \
         Provide brief health advice (3-5 sentences). \
         Be positive and practical with specific lifestyle tips.",
        vitals.systolic, vitals.diastolic, vitals.heart_rate
    )
}

/// Prompt for readings sent as structured fields by the device.
pub fn structured_vitals_prompt(vitals: &Vitals) -> String {
    format!(
        "Act as a cheerful medical advisor. \
         Given BP: {}/{} mmHg, Heart Rate: {} bpm. \
         Provide brief health advice (3-5 sentences). \
         Be positive and practical.",
        vitals.systolic, vitals.diastolic, vitals.heart_rate
    )
}

pub fn general_prompt(question: &str) -> String {
    format!(
        "Please answer this question in a helpful, conversational way:\n\
         Question: {question}\n\n\
         Keep your response clear, concise, and friendly. \
         If it's a complex topic, break it down into simple steps."
    )
}
