use crate::error::MachineError;
use crate::machine::{Flag, Registers};
use crate::opcode::AluOp;

/// `ADD`, `MUL` and `SHL` reduce their result modulo 255, not 256.
const MODULUS: u32 = 0xFF;

/// Apply `op` to registers `a` and `b`, storing the result in `a` (or the flags for `CMP`).
///
/// The target register is left untouched when the operation fails.
pub fn execute(
    op: AluOp,
    a: u8,
    b: u8,
    reg: &mut Registers,
    flag: &mut Flag,
) -> Result<(), MachineError> {
    let lhs = reg.get(a)?;
    // NOT only has a single operand
    let rhs = if op == AluOp::NOT { 0 } else { reg.get(b)? };

    let res = match op {
        AluOp::ADD => reduce(u32::from(lhs) + u32::from(rhs)),
        AluOp::MUL => reduce(u32::from(lhs) * u32::from(rhs)),
        // 2^8 = 1 (mod 255), so only the low 3 bits of the shift matter
        AluOp::SHL => reduce(u32::from(lhs) << (rhs % 8)),
        AluOp::SHR => lhs.checked_shr(rhs.into()).unwrap_or(0),
        AluOp::MOD => {
            if rhs == 0 {
                return Err(MachineError::DivideByZero);
            }
            lhs % rhs
        }
        AluOp::AND => lhs & rhs,
        AluOp::OR => lhs | rhs,
        AluOp::XOR => lhs ^ rhs,
        AluOp::NOT => !lhs,
        AluOp::CMP => {
            *flag = Flag::from(lhs.cmp(&rhs));
            return Ok(());
        }
    };
    *reg.get_mut(a)? = res;
    Ok(())
}

#[inline]
fn reduce(val: u32) -> u8 {
    (val % MODULUS) as u8
}
