pub type Discrete = i32;
pub type Continous = f64;
