/**
 * This directory contains programs based on the implementation of cgzirim/seek-tune. 
 * The original project's source code is licensed under the MIT License and can be
 * found on GitHub. 
 * 
 * This Rust-based refactored version in this repository is licensed under the
 * MPL License.
 */
pub mod spectrogram;
mod filter;