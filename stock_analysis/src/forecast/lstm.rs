//! Stacked LSTM regressor: LSTM (full sequence) -> LSTM (last step) -> Dense(1).
//!
//! Everything is batched: a sequence is a `Vec` of `(batch, features)`
//! matrices, one per time step. Gate pre-activations are laid out as
//! `[input | forget | cell | output]` along the last axis, each `hidden`
//! wide. Gradients come from full backpropagation through time.

use ndarray::{Array1, Array2, Axis, s};
use rand::Rng;

use super::adam::Adam;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Glorot/Xavier uniform initialization for a `(fan_in, fan_out)` matrix.
fn glorot_uniform<R: Rng>(rng: &mut R, fan_in: usize, fan_out: usize) -> Array2<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Array2::from_shape_fn((fan_in, fan_out), |_| rng.random_range(-limit..limit))
}

/// Activations of one time step, kept for the backward pass.
struct StepCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    i: Array2<f64>,
    f: Array2<f64>,
    g: Array2<f64>,
    o: Array2<f64>,
    c_tanh: Array2<f64>,
}

#[derive(Debug, Clone)]
struct LayerGrads {
    kernel: Array2<f64>,
    recurrent: Array2<f64>,
    bias: Array1<f64>,
}

#[derive(Debug, Clone)]
struct LstmLayer {
    hidden: usize,
    /// `(input, 4 * hidden)`
    kernel: Array2<f64>,
    /// `(hidden, 4 * hidden)`
    recurrent: Array2<f64>,
    bias: Array1<f64>,
}

impl LstmLayer {
    fn new<R: Rng>(input: usize, hidden: usize, rng: &mut R) -> Self {
        let mut bias = Array1::<f64>::zeros(4 * hidden);
        // Forget gate starts open.
        bias.slice_mut(s![hidden..2 * hidden]).fill(1.0);
        Self {
            hidden,
            kernel: glorot_uniform(rng, input, 4 * hidden),
            recurrent: glorot_uniform(rng, hidden, 4 * hidden),
            bias,
        }
    }

    fn zero_grads(&self) -> LayerGrads {
        LayerGrads {
            kernel: Array2::zeros(self.kernel.raw_dim()),
            recurrent: Array2::zeros(self.recurrent.raw_dim()),
            bias: Array1::zeros(self.bias.raw_dim()),
        }
    }

    /// Runs the layer over `xs` from a zero state and returns every hidden
    /// state together with the caches needed by [`backward`](Self::backward).
    fn forward(&self, xs: &[Array2<f64>]) -> (Vec<Array2<f64>>, Vec<StepCache>) {
        let h_units = self.hidden;
        let batch = xs.first().map_or(0, |x| x.nrows());
        let mut h = Array2::<f64>::zeros((batch, h_units));
        let mut c = Array2::<f64>::zeros((batch, h_units));
        let mut hs = Vec::with_capacity(xs.len());
        let mut caches = Vec::with_capacity(xs.len());

        for x in xs {
            let z = x.dot(&self.kernel) + h.dot(&self.recurrent) + &self.bias;
            let i = z.slice(s![.., 0..h_units]).mapv(sigmoid);
            let f = z.slice(s![.., h_units..2 * h_units]).mapv(sigmoid);
            let g = z.slice(s![.., 2 * h_units..3 * h_units]).mapv(f64::tanh);
            let o = z.slice(s![.., 3 * h_units..]).mapv(sigmoid);

            let c_next = &f * &c + &i * &g;
            let c_tanh = c_next.mapv(f64::tanh);
            let h_next = &o * &c_tanh;

            caches.push(StepCache {
                x: x.clone(),
                h_prev: h,
                c_prev: c,
                i,
                f,
                g,
                o,
                c_tanh,
            });
            hs.push(h_next.clone());
            h = h_next;
            c = c_next;
        }
        (hs, caches)
    }

    /// Backpropagates `dh_out` (loss gradient w.r.t. each emitted hidden
    /// state) through time. Returns parameter gradients and the gradient
    /// w.r.t. each input step.
    fn backward(&self, caches: &[StepCache], dh_out: &[Array2<f64>]) -> (LayerGrads, Vec<Array2<f64>>) {
        let h_units = self.hidden;
        let mut grads = self.zero_grads();
        let mut dxs = vec![Array2::<f64>::zeros((0, 0)); caches.len()];
        let Some(first) = caches.first() else {
            return (grads, dxs);
        };
        let batch = first.x.nrows();
        let mut dh_next = Array2::<f64>::zeros((batch, h_units));
        let mut dc_next = Array2::<f64>::zeros((batch, h_units));

        for t in (0..caches.len()).rev() {
            let cache = &caches[t];
            let dh = &dh_out[t] + &dh_next;

            let d_o = &dh * &cache.c_tanh;
            let dc = &dc_next + &(&dh * &cache.o * cache.c_tanh.mapv(|v| 1.0 - v * v));
            let di = &dc * &cache.g;
            let dg = &dc * &cache.i;
            let df = &dc * &cache.c_prev;
            dc_next = &dc * &cache.f;

            let mut dz = Array2::<f64>::zeros((batch, 4 * h_units));
            dz.slice_mut(s![.., 0..h_units])
                .assign(&(di * cache.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., h_units..2 * h_units])
                .assign(&(df * cache.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., 2 * h_units..3 * h_units])
                .assign(&(dg * cache.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![.., 3 * h_units..])
                .assign(&(d_o * cache.o.mapv(|v| v * (1.0 - v))));

            grads.kernel += &cache.x.t().dot(&dz);
            grads.recurrent += &cache.h_prev.t().dot(&dz);
            grads.bias += &dz.sum_axis(Axis(0));

            dxs[t] = dz.dot(&self.kernel.t());
            dh_next = dz.dot(&self.recurrent.t());
        }
        (grads, dxs)
    }
}

#[derive(Debug, Clone)]
struct Gradients {
    lower: LayerGrads,
    upper: LayerGrads,
    dense_w: Array2<f64>,
    dense_b: Array1<f64>,
}

/// Two LSTM layers and a linear head, mapping a window of scaled closes to
/// the next scaled close.
#[derive(Debug, Clone)]
pub struct LstmRegressor {
    lower: LstmLayer,
    upper: LstmLayer,
    /// `(hidden, 1)`
    dense_w: Array2<f64>,
    dense_b: Array1<f64>,
}

/// Converts equal-length windows into one `(batch, 1)` matrix per step.
fn to_steps(windows: &[&[f64]]) -> Vec<Array2<f64>> {
    let steps = windows.first().map_or(0, |w| w.len());
    (0..steps)
        .map(|t| Array2::from_shape_fn((windows.len(), 1), |(b, _)| windows[b][t]))
        .collect()
}

impl LstmRegressor {
    pub fn new<R: Rng>(hidden: usize, rng: &mut R) -> Self {
        let lower = LstmLayer::new(1, hidden, rng);
        let upper = LstmLayer::new(hidden, hidden, rng);
        Self {
            lower,
            upper,
            dense_w: glorot_uniform(rng, hidden, 1),
            dense_b: Array1::zeros(1),
        }
    }

    pub fn hidden_units(&self) -> usize {
        self.lower.hidden
    }

    /// Predicts the next scaled value for each window.
    ///
    /// All windows must have the same, non-zero length.
    pub fn predict(&self, windows: &[&[f64]]) -> Vec<f64> {
        let steps = to_steps(windows);
        let (lower_hs, _) = self.lower.forward(&steps);
        let (upper_hs, _) = self.upper.forward(&lower_hs);
        match upper_hs.last() {
            Some(last) => (last.dot(&self.dense_w) + &self.dense_b)
                .column(0)
                .to_vec(),
            None => vec![self.dense_b[0]; windows.len()],
        }
    }

    /// Mean squared error of the batch and its gradients.
    fn loss_and_gradients(&self, windows: &[&[f64]], targets: &[f64]) -> (f64, Gradients) {
        let steps = to_steps(windows);
        let batch = windows.len();
        let (lower_hs, lower_cache) = self.lower.forward(&steps);
        let (upper_hs, upper_cache) = self.upper.forward(&lower_hs);

        let last = upper_hs
            .last()
            .cloned()
            .unwrap_or_else(|| Array2::zeros((batch, self.upper.hidden)));
        let y_hat = last.dot(&self.dense_w) + &self.dense_b;
        let y = Array2::from_shape_fn((batch, 1), |(b, _)| targets[b]);
        let err = &y_hat - &y;
        let loss = err.mapv(|e| e * e).sum() / batch as f64;

        let dy = err * (2.0 / batch as f64);
        let dense_w = last.t().dot(&dy);
        let dense_b = dy.sum_axis(Axis(0));

        let mut dh_upper: Vec<Array2<f64>> = upper_hs
            .iter()
            .map(|h| Array2::zeros(h.raw_dim()))
            .collect();
        if let Some(slot) = dh_upper.last_mut() {
            *slot = dy.dot(&self.dense_w.t());
        }
        let (upper, d_lower_hs) = self.upper.backward(&upper_cache, &dh_upper);
        let (lower, _) = self.lower.backward(&lower_cache, &d_lower_hs);

        (
            loss,
            Gradients {
                lower,
                upper,
                dense_w,
                dense_b,
            },
        )
    }

    /// One optimizer step on a mini-batch. Returns the batch loss before the
    /// update.
    pub fn train_batch(&mut self, windows: &[&[f64]], targets: &[f64], adam: &mut Adam) -> f64 {
        let (loss, grads) = self.loss_and_gradients(windows, targets);
        if !loss.is_finite() {
            return loss;
        }
        adam.begin_step();
        adam.apply(0, &mut self.lower.kernel, &grads.lower.kernel);
        adam.apply(1, &mut self.lower.recurrent, &grads.lower.recurrent);
        adam.apply(2, &mut self.lower.bias, &grads.lower.bias);
        adam.apply(3, &mut self.upper.kernel, &grads.upper.kernel);
        adam.apply(4, &mut self.upper.recurrent, &grads.upper.recurrent);
        adam.apply(5, &mut self.upper.bias, &grads.upper.bias);
        adam.apply(6, &mut self.dense_w, &grads.dense_w);
        adam.apply(7, &mut self.dense_b, &grads.dense_b);
        loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn model(hidden: usize, seed: u64) -> LstmRegressor {
        LstmRegressor::new(hidden, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn initial_weights_follow_layout() {
        let m = model(4, 1);
        assert_eq!(m.lower.kernel.dim(), (1, 16));
        assert_eq!(m.upper.kernel.dim(), (4, 16));
        assert_eq!(m.upper.recurrent.dim(), (4, 16));
        assert_eq!(m.dense_w.dim(), (4, 1));
        assert!(m.lower.bias.slice(s![4..8]).iter().all(|b| *b == 1.0));
        assert!(m.lower.bias.slice(s![0..4]).iter().all(|b| *b == 0.0));
        let limit = (6.0f64 / 17.0).sqrt();
        assert!(m.lower.kernel.iter().all(|w| w.abs() <= limit));
    }

    #[test]
    fn predict_shape() {
        let m = model(3, 2);
        let a = [0.1, 0.2, 0.3];
        let b = [0.3, 0.2, 0.1];
        let out = m.predict(&[&a, &b]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn gradients_match_finite_differences() {
        let mut m = model(3, 7);
        let w1 = [0.1, 0.5, 0.9, 0.4];
        let w2 = [0.8, 0.2, 0.3, 0.6];
        let windows: Vec<&[f64]> = vec![&w1, &w2];
        let targets = [0.7, 0.1];
        let (_, grads) = m.loss_and_gradients(&windows, &targets);

        let eps = 1e-6;
        let check = |analytic: f64, numeric: f64, what: &str| {
            let scale = analytic.abs().max(numeric.abs()).max(1e-6);
            assert!(
                (analytic - numeric).abs() / scale < 1e-4,
                "{what}: analytic {analytic:e} vs numeric {numeric:e}"
            );
        };

        macro_rules! probe {
            ($field:expr, $grad:expr, $idx:expr, $what:expr) => {{
                let orig = $field[$idx];
                $field[$idx] = orig + eps;
                let plus = m.loss_and_gradients(&windows, &targets).0;
                $field[$idx] = orig - eps;
                let minus = m.loss_and_gradients(&windows, &targets).0;
                $field[$idx] = orig;
                check($grad[$idx], (plus - minus) / (2.0 * eps), $what);
            }};
        }

        probe!(m.lower.kernel, grads.lower.kernel, [0, 5], "lower kernel");
        probe!(m.lower.recurrent, grads.lower.recurrent, [2, 9], "lower recurrent");
        probe!(m.lower.bias, grads.lower.bias, [4], "lower forget bias");
        probe!(m.upper.kernel, grads.upper.kernel, [1, 0], "upper kernel");
        probe!(m.upper.recurrent, grads.upper.recurrent, [0, 11], "upper recurrent");
        probe!(m.upper.bias, grads.upper.bias, [7], "upper cell bias");
        probe!(m.dense_w, grads.dense_w, [2, 0], "dense weight");
        probe!(m.dense_b, grads.dense_b, [0], "dense bias");
    }

    #[test]
    fn training_reduces_loss_on_a_fixed_batch() {
        let mut m = model(6, 3);
        let mut adam = Adam::new(0.01);
        let w1 = [0.0, 0.1, 0.2, 0.3];
        let w2 = [0.5, 0.6, 0.7, 0.8];
        let windows: Vec<&[f64]> = vec![&w1, &w2];
        let targets = [0.4, 0.9];

        let first = m.train_batch(&windows, &targets, &mut adam);
        let mut last = first;
        for _ in 0..200 {
            last = m.train_batch(&windows, &targets, &mut adam);
        }
        assert!(last < first * 0.1, "loss {first} -> {last}");
    }
}
