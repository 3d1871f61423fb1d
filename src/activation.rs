pub trait ActivationFunction: Send + Sync + 'static {
    const NAME: &'static str;

    fn apply(x: f64) -> f64;

    /// Derivative expressed through the function's own output `a = apply(x)`.
    fn deriv_from_output(a: f64) -> f64;
}

pub mod activation_functions {
    use super::ActivationFunction;

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct Sigmoid;
    impl ActivationFunction for Sigmoid {
        const NAME: &'static str = "sigmoid";

        fn apply(x: f64) -> f64 {
            1.0 / (1.0 + f64::exp(-x))
        }

        fn deriv_from_output(a: f64) -> f64 {
            a * (1.0 - a)
        }
    }
}
