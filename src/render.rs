//! GPU upload of loaded scenes.
//!
//! This module turns the CPU-side [`Mesh`] arrays into interleaved vertex
//! buffers and 16-bit index buffers, and provides [`DrawMesh`] to issue the
//! draw calls on a render pass. Pipelines, cameras and windowing are left to
//! the embedding application.
//!
//! # Key types
//!
//! - [`MeshVertex`] is the interleaved vertex stored on the GPU
//! - [`GpuMesh`] owns the buffers of one mesh
//!

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::data_structures::{
    model::{triple, Material, Mesh},
    scene_graph::Model,
};

/**
 * The vertex as stored in GPU memory.
 *
 * Layout: position (xyzw), normal, texture coordinate (uv), tangent and
 * bitangent from the mesh's first UV layer.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 4],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl MeshVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 7]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 9]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Interleave a mesh's attribute arrays. Missing attributes read as zero.
pub fn interleave(mesh: &Mesh) -> Vec<MeshVertex> {
    let layer = mesh.uv_layers.first();
    let from_layer = |values: Option<&Vec<f32>>, v: usize| {
        values.and_then(|values| triple(values, v)).unwrap_or_default()
    };

    (0..mesh.vertex_count)
        .map(|v| {
            let [u, w, _] = from_layer(layer.map(|l| &l.uv_coordinates), v);
            MeshVertex {
                position: mesh.position(v).unwrap_or([0.0, 0.0, 0.0, 1.0]),
                normal: mesh.normal(v).unwrap_or_default(),
                tex_coords: [u, w],
                tangent: from_layer(layer.map(|l| &l.tangents), v),
                bitangent: from_layer(layer.map(|l| &l.binormals), v),
            }
        })
        .collect()
}

/// Vertex and index buffers of one uploaded mesh.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: Option<Material>,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertices = interleave(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            name: mesh.name.clone(),
            vertex_buffer,
            index_buffer,
            num_elements: mesh.indices.len() as u32,
            material: mesh.materials.first().cloned(),
        }
    }
}

/// Upload every non-empty mesh of a scene, in traversal order.
pub fn upload_model(device: &wgpu::Device, model: &Model) -> Vec<GpuMesh> {
    model
        .meshes()
        .filter(|mesh| {
            let empty = mesh.indices.is_empty();
            if empty {
                log::debug!("not uploading empty mesh {:?}", mesh.name);
            }
            !empty
        })
        .map(|mesh| GpuMesh::new(device, mesh))
        .collect()
}

pub trait DrawMesh {
    fn draw_gpu_mesh(&mut self, mesh: &GpuMesh);
    fn draw_gpu_mesh_instanced(&mut self, mesh: &GpuMesh, instances: Range<u32>);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_gpu_mesh(&mut self, mesh: &GpuMesh) {
        self.draw_gpu_mesh_instanced(mesh, 0..1);
    }

    fn draw_gpu_mesh_instanced(&mut self, mesh: &GpuMesh, instances: Range<u32>) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}
