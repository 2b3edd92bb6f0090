//! Environment calls, dispatched on a7.
//!
//! 1 print_int, 4 print_string, 9 sbrk, 10 exit, 11 print_char, 17 exit with
//! code. Anything else is a runtime error. Handlers validate before they
//! mutate so a failing call leaves no trace.

use super::{Diff, Simulator};
use crate::kestrel::arch;
use crate::kestrel::errors::ExecError;
use crate::kestrel::registers::{A0, A7};

impl Simulator {
    pub(super) fn ecall(&mut self, diffs: &mut Vec<Diff>) -> Result<(), ExecError> {
        match self.cpu.read(A7) {
            // print the signed integer in a0
            1 => {
                let s = (self.cpu.read(A0) as i32).to_string();
                self.emit(&s);
            }
            // print the NUL-terminated string a0 points at
            4 => {
                let mut addr = self.cpu.read(A0);
                let mut bytes = Vec::new();
                loop {
                    let b = self.mem.load8(addr)?;
                    if b == 0 {
                        break;
                    }
                    bytes.push(b);
                    addr = addr.wrapping_add(1);
                }
                let s = String::from_utf8_lossy(&bytes).into_owned();
                self.emit(&s);
            }
            // sbrk: a0 bytes; returns the old break in a0
            9 => {
                let bytes = self.cpu.read(A0) as i32;
                let brk = self.cpu.heap;
                let next = brk as i64 + bytes as i64;
                if next < arch::HEAP_BEGIN as i64 || next > arch::HEAP_END as i64 {
                    return Err(ExecError::HeapOverflow(bytes));
                }
                self.write_reg(diffs, A0, brk);
                self.set_heap(diffs, next as u32);
            }
            // exit
            10 => self.done = true,
            // print the character in a0
            11 => {
                let c = (self.cpu.read(A0) & 0xFF) as u8 as char;
                self.emit(&c.to_string());
            }
            // exit with the code in a0
            17 => {
                self.exit_code = self.cpu.read(A0);
                self.done = true;
            }
            code => return Err(ExecError::UnknownSyscall(code)),
        }
        Ok(())
    }

    fn emit(&mut self, s: &str) {
        self.stdout.push_str(s);
        self.out.write_str(s);
    }
}
