use std::sync::Arc;

use crate::audio::SampleBuffer;
use crate::pipeline::params::ProcessingParameters;
use crate::pipeline::quantizer::Quantizer;
use crate::pipeline::resampler::Resampler;
use crate::pipeline::traits::{Chain, Node, NodeExt};

/// The offline processing chain: resample, then quantize.
///
/// Built fresh from a parameter snapshot for every pass and always fed the
/// untouched original, so the same parameters give bit-identical output no
/// matter what ran before.
pub struct ProcessingPipeline {
    chain: Chain<Resampler, Quantizer>,
}

impl ProcessingPipeline {
    pub fn new(params: &ProcessingParameters) -> Self {
        Self {
            chain: Resampler::new(params.target_sample_rate())
                .connect(Quantizer::new(params.bit_depth())),
        }
    }

    pub fn run(&self, original: &Arc<SampleBuffer>) -> SampleBuffer {
        self.chain.process(Arc::clone(original))
    }
}

/// Run one full pass over `original` with `params`.
pub fn process(original: &Arc<SampleBuffer>, params: &ProcessingParameters) -> SampleBuffer {
    ProcessingPipeline::new(params).run(original)
}
