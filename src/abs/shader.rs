//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for managing OpenGL shaders.
//! This module also provides the [`Uniform`] trait for setting uniform variables in shader
//! programs.

use std::sync::Arc;

use glam::{Mat3, Mat4, Vec3};
use glow::HasContext;

/// Represents an individual OpenGL shader.
pub struct Shader {
    gl: Arc<glow::Context>,
    id: glow::Shader,
    _shader_type: u32,
}

impl Shader {
    /// Compiles a new shader from the given source code. On failure the
    /// error carries the driver's info log.
    pub fn new(gl: &Arc<glow::Context>, shader_type: u32, source: &str) -> Result<Self, String> {
        unsafe {
            let shader = gl.create_shader(shader_type).map_err(|e| e.to_string())?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(log);
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: shader,
                _shader_type: shader_type,
            })
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_shader(self.id);
        }
    }
}

/// Runs the vertex and fragment compile steps and the link step in order,
/// stopping at the first failure.
pub fn compile_and_link<S, P, E>(
    vertex: impl FnOnce() -> Result<S, E>,
    fragment: impl FnOnce() -> Result<S, E>,
    link: impl FnOnce(S, S) -> Result<P, E>,
) -> Result<P, E> {
    let vertex = vertex()?;
    let fragment = fragment()?;
    link(vertex, fragment)
}

/// Represents a uniform variable in a shader program.
pub trait Uniform {
    /// Sets the value of the uniform variable in the given shader program.
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str);
}

impl Uniform for i32 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        unsafe {
            let location = gl.get_uniform_location(program, name);
            if let Some(loc) = location {
                gl.uniform_1_i32(Some(&loc), *self);
            }
        }
    }
}

impl Uniform for f32 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        unsafe {
            let location = gl.get_uniform_location(program, name);
            if let Some(loc) = location {
                gl.uniform_1_f32(Some(&loc), *self);
            }
        }
    }
}

impl Uniform for Vec3 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        unsafe {
            let location = gl.get_uniform_location(program, name);
            if let Some(loc) = location {
                gl.uniform_3_f32(Some(&loc), self.x, self.y, self.z);
            }
        }
    }
}

impl Uniform for Mat3 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        unsafe {
            let location = gl.get_uniform_location(program, name);
            if let Some(loc) = location {
                gl.uniform_matrix_3_f32_slice(Some(&loc), false, self.as_ref());
            }
        }
    }
}

impl Uniform for Mat4 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        unsafe {
            let location = gl.get_uniform_location(program, name);
            if let Some(loc) = location {
                gl.uniform_matrix_4_f32_slice(Some(&loc), false, self.as_ref());
            }
        }
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        (*self).set_uniform(gl, program, name);
    }
}

/// Represents an OpenGL shader program composed of multiple shaders.
pub struct ShaderProgram {
    gl: Arc<glow::Context>,
    id: glow::Program,
}

impl ShaderProgram {
    /// Links a new shader program from the given shaders.
    pub fn new(gl: &Arc<glow::Context>, shaders: &[&Shader]) -> Result<Self, String> {
        unsafe {
            let program = gl.create_program().map_err(|e| e.to_string())?;

            for shader in shaders {
                gl.attach_shader(program, shader.id);
            }

            gl.link_program(program);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(log);
            }

            for shader in shaders {
                gl.detach_shader(program, shader.id);
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: program,
            })
        }
    }

    /// Compiles a vertex/fragment shader pair and links them into a program.
    pub fn from_sources(
        gl: &Arc<glow::Context>,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self, String> {
        compile_and_link(
            || Shader::new(gl, glow::VERTEX_SHADER, vertex_src),
            || Shader::new(gl, glow::FRAGMENT_SHADER, fragment_src),
            |vertex, fragment| Self::new(gl, &[&vertex, &fragment]),
        )
    }

    /// Binds the shader program for use.
    pub fn use_program(&self) {
        unsafe {
            self.gl.use_program(Some(self.id));
        }
    }

    /// Sets a uniform variable in the shader program.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        value.set_uniform(&self.gl, self.id, name);
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_program(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn failed_vertex_compile_skips_fragment_and_link() {
        let fragment_compiled = Cell::new(false);
        let linked = Cell::new(false);

        let result: Result<(), String> = compile_and_link(
            || Err("0:1(1): error: syntax error".to_string()),
            || {
                fragment_compiled.set(true);
                Ok(())
            },
            |(), ()| {
                linked.set(true);
                Ok(())
            },
        );

        assert!(result.is_err());
        assert!(!fragment_compiled.get());
        assert!(!linked.get());
    }

    #[test]
    fn failed_fragment_compile_skips_link() {
        let linked = Cell::new(false);

        let result: Result<(), String> = compile_and_link(
            || Ok(()),
            || Err("0:4(2): error: undeclared identifier".to_string()),
            |(), ()| {
                linked.set(true);
                Ok(())
            },
        );

        assert!(result.is_err());
        assert!(!linked.get());
    }

    #[test]
    fn successful_stages_reach_link() {
        let result: Result<&str, String> =
            compile_and_link(|| Ok("vert"), || Ok("frag"), |v, f| {
                assert_eq!((v, f), ("vert", "frag"));
                Ok("program")
            });

        assert_eq!(result.unwrap(), "program");
    }
}
