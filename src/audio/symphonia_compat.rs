//! Symphonia compatibility layer.
//!
//! All workarounds for symphonia's sample-format zoo live here.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Channel count of a decoded packet.
pub fn decoded_channels(decoded: &AudioBufferRef) -> usize {
    decoded.spec().channels.count()
}

/// Appends a decoded packet to planar `f32` channel vectors.
///
/// Every symphonia sample format is normalized to `[-1.0, 1.0]`. Channels are
/// matched by index; if `output` has more channels than the packet, the extra
/// ones are filled from `ch % packet_channels` so lengths stay equal.
pub fn extract_samples(decoded: &AudioBufferRef, output: &mut [Vec<f32>]) {
    match decoded {
        AudioBufferRef::U8(buf) => append_planar(&**buf, output),
        AudioBufferRef::U16(buf) => append_planar(&**buf, output),
        AudioBufferRef::U24(buf) => append_planar(&**buf, output),
        AudioBufferRef::U32(buf) => append_planar(&**buf, output),
        AudioBufferRef::S8(buf) => append_planar(&**buf, output),
        AudioBufferRef::S16(buf) => append_planar(&**buf, output),
        AudioBufferRef::S24(buf) => append_planar(&**buf, output),
        AudioBufferRef::S32(buf) => append_planar(&**buf, output),
        AudioBufferRef::F32(buf) => append_planar(&**buf, output),
        AudioBufferRef::F64(buf) => append_planar(&**buf, output),
    }
}

fn append_planar<S>(buf: &AudioBuffer<S>, output: &mut [Vec<f32>])
where
    S: Sample + IntoSample<f32>,
{
    let num_channels = buf.spec().channels.count();
    if num_channels == 0 {
        return;
    }
    for (ch, out) in output.iter_mut().enumerate() {
        let src = buf.chan(ch % num_channels);
        out.extend(src.iter().map(|&s| s.into_sample()));
    }
}
