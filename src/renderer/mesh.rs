use std::collections::HashMap;
use std::sync::{Arc, Weak};

use wgpu::util::DeviceExt;

use super::vertex::interleave;
use crate::asset::{MeshData, Model, ModelRef};

pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertices = interleave(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} vertices", label)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} indices", label)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

struct Uploaded {
    model: Weak<Model>,
    meshes: Vec<GpuMesh>,
}

/// GPU copies of models, uploaded once per loaded model. Mesh order matches
/// [`Model::meshes`].
#[derive(Default)]
pub struct MeshCache {
    uploaded: HashMap<String, Uploaded>,
}

impl MeshCache {
    pub fn get_or_upload(&mut self, device: &wgpu::Device, model: &ModelRef) -> &[GpuMesh] {
        let key = model.source();
        let stale = self
            .uploaded
            .get(key)
            .map(|entry| !Weak::ptr_eq(&entry.model, &Arc::downgrade(model)))
            .unwrap_or(true);

        if stale {
            log::debug!("Uploading {} meshes for {}", model.meshes().len(), key);
            let meshes = model
                .meshes()
                .iter()
                .enumerate()
                .map(|(i, mesh)| GpuMesh::upload(device, &format!("{}#{}", key, i), mesh))
                .collect();
            self.uploaded.insert(
                key.to_string(),
                Uploaded {
                    model: Arc::downgrade(model),
                    meshes,
                },
            );
        }

        self.uploaded
            .get(key)
            .map(|entry| entry.meshes.as_slice())
            .unwrap_or(&[])
    }

    /// Drops uploads whose model is no longer referenced anywhere.
    pub fn prune(&mut self) {
        self.uploaded
            .retain(|_, entry| entry.model.strong_count() > 0);
    }
}
