// THEORY:
// The rescaler bounds the working resolution. When the loader aliased the working
// image to the source there is nothing to do. Otherwise every worker fills its own
// slice of the output pixels (flattened row-major) by bicubic sampling into the
// source at normalized coordinates, so the whole resample runs without a lock.

use crate::core_modules::bicubic;
use crate::core_modules::partition;
use crate::core_modules::shared_state::Frames;

/// Fills this worker's share of the working image. A no-op for aliased frames.
pub fn rescale(frames: &Frames, tid: usize, workers: usize) {
    if frames.is_aliased() {
        return;
    }

    let source = frames.source.as_ref();
    let target = frames.working.as_ref();
    let width = target.width() as usize;
    let height = target.height() as usize;
    let u_scale = if width > 1 { 1.0 / (width - 1) as f32 } else { 0.0 };
    let v_scale = if height > 1 { 1.0 / (height - 1) as f32 } else { 0.0 };

    for index in partition::slice(tid, workers, target.pixel_count()) {
        let row = index / width;
        let col = index % width;
        let sample = bicubic::sample(source, col as f32 * u_scale, row as f32 * v_scale);
        target.set_index(index, sample);
    }
}
