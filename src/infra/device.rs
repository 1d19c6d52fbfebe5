// ============================================================
// Layer 6 — Device Selector
// ============================================================
// Picks where both models run, once, before they are loaded.
//
// Preference order: first discrete GPU, first integrated GPU,
// then the CPU. GPUs run on the wgpu backend; the CPU runs on
// ndarray, which needs no adapter at all.
//
// wgpu reports a missing adapter by panicking on first use,
// so each GPU candidate is checked with a tiny tensor op
// inside catch_unwind.

use std::panic::{self, AssertUnwindSafe};

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::wgpu::WgpuDevice;
use burn::prelude::*;

use crate::ml::{CpuBackend, GpuBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDevice {
    DiscreteGpu(usize),
    IntegratedGpu(usize),
    Cpu,
}

impl ComputeDevice {
    pub fn detect() -> Self {
        let device = [Self::DiscreteGpu(0), Self::IntegratedGpu(0)]
            .into_iter()
            .find(|candidate| candidate.is_usable())
            .unwrap_or(Self::Cpu);
        tracing::info!("Device set to use {device}");
        device
    }

    /// The wgpu adapter for a GPU; `None` for the CPU.
    pub fn wgpu(self) -> Option<WgpuDevice> {
        match self {
            Self::DiscreteGpu(i)   => Some(WgpuDevice::DiscreteGpu(i)),
            Self::IntegratedGpu(i) => Some(WgpuDevice::IntegratedGpu(i)),
            Self::Cpu              => None,
        }
    }

    pub fn is_usable(&self) -> bool {
        let check = panic::catch_unwind(AssertUnwindSafe(|| match self.wgpu() {
            Some(device) => {
                Tensor::<GpuBackend, 1>::from_floats([1.0, 2.0], &device).sum().into_scalar();
            }
            None => {
                Tensor::<CpuBackend, 1>::from_floats([1.0, 2.0], &NdArrayDevice::Cpu).sum().into_scalar();
            }
        }));
        match check {
            Ok(_) => true,
            Err(_) => {
                tracing::debug!("{self} is not available");
                false
            }
        }
    }
}

impl std::fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiscreteGpu(i)   => write!(f, "gpu:{i}"),
            Self::IntegratedGpu(i) => write!(f, "igpu:{i}"),
            Self::Cpu              => write!(f, "cpu"),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpus_map_onto_wgpu_devices() {
        assert_eq!(ComputeDevice::DiscreteGpu(1).wgpu(), Some(WgpuDevice::DiscreteGpu(1)));
        assert_eq!(ComputeDevice::IntegratedGpu(0).wgpu(), Some(WgpuDevice::IntegratedGpu(0)));
        assert_eq!(ComputeDevice::Cpu.wgpu(), None);
    }

    #[test]
    fn test_cpu_fallback_is_always_usable() {
        assert!(ComputeDevice::Cpu.is_usable());
        // Whatever the host has, the chosen device can run a tensor op
        assert!(ComputeDevice::detect().is_usable());
    }

    #[test]
    fn test_display() {
        assert_eq!(ComputeDevice::DiscreteGpu(0).to_string(), "gpu:0");
        assert_eq!(ComputeDevice::Cpu.to_string(), "cpu");
    }
}
