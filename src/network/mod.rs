//! Read-only layered view over a trained binary convolutional classifier
//!
//! A [`LayeredNetwork`] holds an ordered layer sequence with per-layer shape
//! metadata, precomputed at construction. It is immutable afterwards and
//! `Send + Sync`, so one loaded model can serve concurrent inferences as a
//! shared read-only handle.

mod forward;

use ndarray::Array1;

use crate::error::{ExplainError, Result};

/// Shape of the feature tensor flowing between layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureShape {
    /// Spatial feature map, HWC layout.
    Spatial { height: usize, width: usize, channels: usize },
    /// Flattened feature vector.
    Flat(usize),
}

impl FeatureShape {
    /// Total element count.
    pub fn len(&self) -> usize {
        match *self {
            FeatureShape::Spatial { height, width, channels } => height * width * channels,
            FeatureShape::Flat(len) => len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trained 2D convolution: weights `[kh, kw, cin, cout]`, bias `[cout]`.
#[derive(Debug, Clone)]
pub struct Conv2D {
    pub(crate) kernel_h: usize,
    pub(crate) kernel_w: usize,
    pub(crate) in_channels: usize,
    pub(crate) out_channels: usize,
    pub(crate) weights: Array1<f32>,
    pub(crate) bias: Array1<f32>,
}

impl Conv2D {
    pub fn new(
        kernel_h: usize,
        kernel_w: usize,
        in_channels: usize,
        out_channels: usize,
        weights: Vec<f32>,
        bias: Vec<f32>,
    ) -> Result<Self> {
        if kernel_h == 0 || kernel_w == 0 || in_channels == 0 || out_channels == 0 {
            return Err(ExplainError::InvalidConfig(
                "Conv2D dimensions must be nonzero".to_string(),
            ));
        }
        let expected = kernel_h * kernel_w * in_channels * out_channels;
        if weights.len() != expected {
            return Err(ExplainError::InvalidConfig(format!(
                "Conv2D weights: expected {expected} values, got {}",
                weights.len()
            )));
        }
        if bias.len() != out_channels {
            return Err(ExplainError::InvalidConfig(format!(
                "Conv2D bias: expected {out_channels} values, got {}",
                bias.len()
            )));
        }
        Ok(Self {
            kernel_h,
            kernel_w,
            in_channels,
            out_channels,
            weights: Array1::from(weights),
            bias: Array1::from(bias),
        })
    }
}

/// Trained fully-connected layer: weights `[in, out]` row-major, bias `[out]`.
#[derive(Debug, Clone)]
pub struct Dense {
    pub(crate) in_dim: usize,
    pub(crate) out_dim: usize,
    pub(crate) weights: Array1<f32>,
    pub(crate) bias: Array1<f32>,
}

impl Dense {
    pub fn new(in_dim: usize, out_dim: usize, weights: Vec<f32>, bias: Vec<f32>) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(ExplainError::InvalidConfig(
                "Dense dimensions must be nonzero".to_string(),
            ));
        }
        if weights.len() != in_dim * out_dim {
            return Err(ExplainError::InvalidConfig(format!(
                "Dense weights: expected {} values, got {}",
                in_dim * out_dim,
                weights.len()
            )));
        }
        if bias.len() != out_dim {
            return Err(ExplainError::InvalidConfig(format!(
                "Dense bias: expected {out_dim} values, got {}",
                bias.len()
            )));
        }
        Ok(Self {
            in_dim,
            out_dim,
            weights: Array1::from(weights),
            bias: Array1::from(bias),
        })
    }
}

/// One layer of the classifier.
#[derive(Debug, Clone)]
pub enum Layer {
    Conv2D(Conv2D),
    MaxPool2D { window: usize },
    ReLU,
    Flatten,
    Dense(Dense),
    Sigmoid,
}

impl Layer {
    /// Human-readable layer kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Layer::Conv2D(_) => "Conv2D",
            Layer::MaxPool2D { .. } => "MaxPool2D",
            Layer::ReLU => "ReLU",
            Layer::Flatten => "Flatten",
            Layer::Dense(_) => "Dense",
            Layer::Sigmoid => "Sigmoid",
        }
    }

    /// Shape produced when this layer consumes `input`.
    fn output_shape(&self, index: usize, input: FeatureShape) -> Result<FeatureShape> {
        let incompatible = |detail: String| {
            ExplainError::InvalidConfig(format!(
                "layer {index} ({}): {detail}",
                self.kind()
            ))
        };
        match self {
            Layer::Conv2D(conv) => match input {
                FeatureShape::Spatial { height, width, channels } => {
                    if channels != conv.in_channels {
                        return Err(incompatible(format!(
                            "expects {} input channels, got {channels}",
                            conv.in_channels
                        )));
                    }
                    if height < conv.kernel_h || width < conv.kernel_w {
                        return Err(incompatible(format!(
                            "kernel {}x{} larger than input {height}x{width}",
                            conv.kernel_h, conv.kernel_w
                        )));
                    }
                    Ok(FeatureShape::Spatial {
                        height: height - conv.kernel_h + 1,
                        width: width - conv.kernel_w + 1,
                        channels: conv.out_channels,
                    })
                }
                FeatureShape::Flat(_) => {
                    Err(incompatible("requires a spatial input".to_string()))
                }
            },
            Layer::MaxPool2D { window } => match input {
                FeatureShape::Spatial { height, width, channels } => {
                    if *window == 0 || height < *window || width < *window {
                        return Err(incompatible(format!(
                            "window {window} does not fit input {height}x{width}"
                        )));
                    }
                    Ok(FeatureShape::Spatial {
                        height: height / window,
                        width: width / window,
                        channels,
                    })
                }
                FeatureShape::Flat(_) => {
                    Err(incompatible("requires a spatial input".to_string()))
                }
            },
            Layer::ReLU | Layer::Sigmoid => Ok(input),
            Layer::Flatten => Ok(FeatureShape::Flat(input.len())),
            Layer::Dense(dense) => match input {
                FeatureShape::Flat(len) if len == dense.in_dim => {
                    Ok(FeatureShape::Flat(dense.out_dim))
                }
                other => Err(incompatible(format!(
                    "expects a flat input of {} values, got {other:?}",
                    dense.in_dim
                ))),
            },
        }
    }
}

/// Prepared input image: flat HWC data with values in `[0, 1]`.
///
/// Produced by an external preprocessing subsystem; the pipeline never
/// mutates it. Inference runs one image at a time, so the conventional
/// unit batch dimension is dropped and the shape is the 3-D
/// `(height, width, channels)` triple.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    data: Array1<f32>,
    height: usize,
    width: usize,
    channels: usize,
}

impl ImageTensor {
    pub fn new(data: Vec<f32>, height: usize, width: usize, channels: usize) -> Result<Self> {
        if data.len() != height * width * channels {
            return Err(ExplainError::InvalidConfig(format!(
                "image data: expected {} values for {height}x{width}x{channels}, got {}",
                height * width * channels,
                data.len()
            )));
        }
        Ok(Self {
            data: Array1::from(data),
            height,
            width,
            channels,
        })
    }

    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(height, width, channels)` triple.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }
}

/// Immutable ordered layer sequence with precomputed per-layer shapes.
#[derive(Debug, Clone)]
pub struct LayeredNetwork {
    input_shape: (usize, usize, usize),
    layers: Vec<Layer>,
    /// Output shape of each layer, same order as `layers`.
    shapes: Vec<FeatureShape>,
}

impl LayeredNetwork {
    /// Build a network over `(height, width, channels)` inputs, validating
    /// that every layer can consume its predecessor's output and that the
    /// final layer produces a single score.
    pub fn new(input_shape: (usize, usize, usize), layers: Vec<Layer>) -> Result<Self> {
        let (height, width, channels) = input_shape;
        if height == 0 || width == 0 || channels == 0 {
            return Err(ExplainError::InvalidConfig(
                "input shape must be nonzero in every dimension".to_string(),
            ));
        }
        if layers.is_empty() {
            return Err(ExplainError::InvalidConfig(
                "network has no layers".to_string(),
            ));
        }

        let mut shape = FeatureShape::Spatial { height, width, channels };
        let mut shapes = Vec::with_capacity(layers.len());
        for (index, layer) in layers.iter().enumerate() {
            shape = layer.output_shape(index, shape)?;
            shapes.push(shape);
        }

        if shape.len() != 1 {
            return Err(ExplainError::InvalidConfig(format!(
                "classifier head must produce a single score, got {shape:?}"
            )));
        }

        Ok(Self { input_shape, layers, shapes })
    }

    /// Declared `(height, width, channels)` input shape.
    pub fn input_shape(&self) -> (usize, usize, usize) {
        self.input_shape
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Output shape of the layer at `index`.
    pub fn shape_at(&self, index: usize) -> FeatureShape {
        self.shapes[index]
    }

    /// Enumerated layer kinds, for diagnostics.
    pub fn layer_kinds(&self) -> Vec<String> {
        self.layers
            .iter()
            .enumerate()
            .map(|(i, layer)| format!("{i}: {}", layer.kind()))
            .collect()
    }

    /// Index of the last Conv2D layer whose output retains spatial extent
    /// beyond a single cell. Ties are impossible in a sequential model;
    /// "last" means last in layer order.
    pub fn last_spatial_conv(&self) -> Option<usize> {
        let mut found = None;
        for (index, layer) in self.layers.iter().enumerate() {
            if let Layer::Conv2D(_) = layer {
                if let FeatureShape::Spatial { height, width, .. } = self.shapes[index] {
                    if height * width > 1 {
                        found = Some(index);
                    }
                }
            }
        }
        found
    }

    /// Validate that `input` matches the declared input shape.
    pub fn check_input(&self, input: &ImageTensor) -> Result<()> {
        if input.shape() != self.input_shape {
            return Err(ExplainError::InvalidInputShape {
                expected: self.input_shape,
                got: input.shape(),
            });
        }
        Ok(())
    }
}
