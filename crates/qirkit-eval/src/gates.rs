//! Callbacks for the quantum operations an evaluated program performs.

use std::fmt;

/// Summary handed to [`GateSet::finish`] once the entry point returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metadata {
    /// One past the highest qubit id the program touched.
    pub number_of_qubits: usize,
}

/// Receives each quantum operation in program order. Every hook defaults to doing nothing.
///
/// Qubit and result arguments are static handle ids: `%Qubit* null` is qubit `0`,
/// `inttoptr (i64 3 to %Qubit*)` is qubit `3`.
#[allow(unused_variables)]
pub trait GateSet {
    fn cx(&mut self, control: u64, target: u64) {}
    fn cy(&mut self, control: u64, target: u64) {}
    fn cz(&mut self, control: u64, target: u64) {}
    fn ccx(&mut self, control1: u64, control2: u64, target: u64) {}
    fn swap(&mut self, qubit1: u64, qubit2: u64) {}
    fn h(&mut self, qubit: u64) {}
    fn s(&mut self, qubit: u64) {}
    fn s_adj(&mut self, qubit: u64) {}
    fn t(&mut self, qubit: u64) {}
    fn t_adj(&mut self, qubit: u64) {}
    fn x(&mut self, qubit: u64) {}
    fn y(&mut self, qubit: u64) {}
    fn z(&mut self, qubit: u64) {}
    fn rx(&mut self, theta: f64, qubit: u64) {}
    fn ry(&mut self, theta: f64, qubit: u64) {}
    fn rz(&mut self, theta: f64, qubit: u64) {}
    fn rxx(&mut self, theta: f64, qubit1: u64, qubit2: u64) {}
    fn ryy(&mut self, theta: f64, qubit1: u64, qubit2: u64) {}
    fn rzz(&mut self, theta: f64, qubit1: u64, qubit2: u64) {}
    fn reset(&mut self, qubit: u64) {}
    fn m(&mut self, qubit: u64, result: u64) {}
    fn mz(&mut self, qubit: u64, result: u64) {}
    fn mresetz(&mut self, qubit: u64, result: u64) {}
    fn finish(&mut self, metadata: &Metadata) {}
}

/// Records every operation as one line of text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateLogger {
    pub number_of_qubits: usize,
    pub number_of_registers: usize,
    pub instructions: Vec<String>,
}

impl GateLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&mut self, line: String) {
        self.instructions.push(line);
    }
}

impl GateSet for GateLogger {
    fn cx(&mut self, control: u64, target: u64) {
        self.log(format!("cx qubit[{}], qubit[{}]", control, target));
    }

    fn cy(&mut self, control: u64, target: u64) {
        self.log(format!("cy qubit[{}], qubit[{}]", control, target));
    }

    fn cz(&mut self, control: u64, target: u64) {
        self.log(format!("cz qubit[{}], qubit[{}]", control, target));
    }

    fn ccx(&mut self, control1: u64, control2: u64, target: u64) {
        self.log(format!(
            "ccx qubit[{}], qubit[{}], qubit[{}]",
            control1, control2, target
        ));
    }

    fn swap(&mut self, qubit1: u64, qubit2: u64) {
        self.log(format!("swap qubit[{}], qubit[{}]", qubit1, qubit2));
    }

    fn h(&mut self, qubit: u64) {
        self.log(format!("h qubit[{}]", qubit));
    }

    fn s(&mut self, qubit: u64) {
        self.log(format!("s qubit[{}]", qubit));
    }

    fn s_adj(&mut self, qubit: u64) {
        self.log(format!("s_adj qubit[{}]", qubit));
    }

    fn t(&mut self, qubit: u64) {
        self.log(format!("t qubit[{}]", qubit));
    }

    fn t_adj(&mut self, qubit: u64) {
        self.log(format!("t_adj qubit[{}]", qubit));
    }

    fn x(&mut self, qubit: u64) {
        self.log(format!("x qubit[{}]", qubit));
    }

    fn y(&mut self, qubit: u64) {
        self.log(format!("y qubit[{}]", qubit));
    }

    fn z(&mut self, qubit: u64) {
        self.log(format!("z qubit[{}]", qubit));
    }

    fn rx(&mut self, theta: f64, qubit: u64) {
        self.log(format!("rx theta[{:?}] qubit[{}]", theta, qubit));
    }

    fn ry(&mut self, theta: f64, qubit: u64) {
        self.log(format!("ry theta[{:?}] qubit[{}]", theta, qubit));
    }

    fn rz(&mut self, theta: f64, qubit: u64) {
        self.log(format!("rz theta[{:?}] qubit[{}]", theta, qubit));
    }

    fn rxx(&mut self, theta: f64, qubit1: u64, qubit2: u64) {
        self.log(format!(
            "rxx theta[{:?}] qubit[{}], qubit[{}]",
            theta, qubit1, qubit2
        ));
    }

    fn ryy(&mut self, theta: f64, qubit1: u64, qubit2: u64) {
        self.log(format!(
            "ryy theta[{:?}] qubit[{}], qubit[{}]",
            theta, qubit1, qubit2
        ));
    }

    fn rzz(&mut self, theta: f64, qubit1: u64, qubit2: u64) {
        self.log(format!(
            "rzz theta[{:?}] qubit[{}], qubit[{}]",
            theta, qubit1, qubit2
        ));
    }

    fn reset(&mut self, qubit: u64) {
        self.log(format!("reset {}", qubit));
    }

    fn m(&mut self, qubit: u64, result: u64) {
        self.log(format!("m qubit[{}] => out[{}]", qubit, result));
    }

    fn mz(&mut self, qubit: u64, result: u64) {
        self.m(qubit, result);
    }

    fn mresetz(&mut self, qubit: u64, result: u64) {
        self.m(qubit, result);
        self.reset(qubit);
    }

    fn finish(&mut self, metadata: &Metadata) {
        self.number_of_qubits = metadata.number_of_qubits;
        self.number_of_registers = metadata.number_of_qubits;
    }
}

impl fmt::Display for GateLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "qubits[{}]", self.number_of_qubits)?;
        writeln!(f, "out[{}]", self.number_of_registers)?;
        for instruction in &self.instructions {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}
