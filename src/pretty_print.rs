use std::fmt::{self, Debug, Display};

use crate::{ActivationFunction, activation_functions::Sigmoid, param_buffer};

/// Renders one layer as `a_u = sigmoid([w] a_(u-1) + [b])`, one line per destination neuron.
pub struct PrettyPrintParams<'a> {
    i_layer: usize,
    layer: param_buffer::LayerRef<'a>,
}

impl<'a> PrettyPrintParams<'a> {
    pub fn new(i_layer: usize, layer: param_buffer::LayerRef<'a>) -> Self {
        Self { i_layer, layer }
    }
}

impl Debug for PrettyPrintParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

fn n_digits(u: usize) -> usize {
    match u {
        0 => 1,
        u => ((u as f64).log10() + 1.0) as usize,
    }
}

fn write_signed(f: &mut fmt::Formatter, x: f64) -> fmt::Result {
    if x.is_sign_positive() {
        write!(f, " {x:.04?}")
    } else {
        write!(f, "{x:.04?}")
    }
}

impl Display for PrettyPrintParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let w = self.layer.w();
        let b = self.layer.b();
        let center_line = self.layer.n / 2;
        let phi = Sigmoid::NAME;
        // Parameter layer `u` produces neuron layer `u + 1`; neuron layer 0 is the input `x`.
        let i_layer = self.i_layer + 1;
        let i_layer_length = n_digits(i_layer);
        let i_previous_layer_length = match self.i_layer {
            0 => 1, // "x"
            i_previous => n_digits(i_previous),
        };
        for j in 0..self.layer.n {
            if j == center_line {
                write!(f, "a_{i_layer} = {phi}(")?;
            } else {
                write!(f, "{:width$}", "", width = 6 + phi.len() + i_layer_length)?;
            }
            write!(f, "[")?;
            for i in 0..self.layer.n_previous {
                if i != 0 {
                    write!(f, " ")?;
                }
                write_signed(f, w[(i, j)])?;
            }
            write!(f, "]")?;
            if j == center_line {
                match self.i_layer {
                    0 => write!(f, " x + ")?,
                    i_previous => write!(f, " a_{i_previous} + ")?,
                }
            } else {
                write!(f, "{:width$}", "", width = 4 + i_previous_layer_length)?;
            }
            write!(f, "[")?;
            write_signed(f, b[j])?;
            write!(f, "]")?;
            if j == center_line {
                write!(f, ")")?;
            }
            if j != self.layer.n - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{NeuralNetwork, Topology};

    #[test]
    fn one_line_per_neuron() {
        let mut nn = NeuralNetwork::zeroed(Topology::new([2, 3]).unwrap());
        *nn.params_layer_mut(0).unwrap().weight_mut(1, 1) = -0.5;
        let text = nn.params().pretty_print_layer(0).unwrap().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("a_1 = sigmoid([ 0.0000 -0.5000] x + [ 0.0000])"));
    }
}
